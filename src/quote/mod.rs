//! Quote builder core
//!
//! A pure state machine behind the interactive `offsite quote` command: a
//! service catalog, a draft plan mutated only through [`PlanEvent`]s, per-step
//! validation gates, and a summary projection with a plain-text export.

pub mod catalog;
pub mod plan;
pub mod summary;
pub mod wizard;

pub use catalog::{AssetQuestion, CatalogService, PriceType, ServiceCatalog, SubOption};
pub use plan::{Contact, ContactErrors, ContactField, PlanEvent, QuotePlan, validate_contact};
pub use summary::{QuoteTotals, format_price, format_usd, render_plain_text, totals};
pub use wizard::{WizardStep, can_advance, contact_errors};
