//! Wizard steps and advancement gates
//!
//! Five linear steps with forward progress gated per step. Gates return
//! booleans (and an error map for the contact step); they never panic and
//! never mutate the plan.

use crate::quote::catalog::ServiceCatalog;
use crate::quote::plan::{ContactErrors, QuotePlan, validate_contact};

/// The wizard cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Services,
    Details,
    Assets,
    Contact,
    Summary,
}

impl WizardStep {
    pub const FIRST: WizardStep = WizardStep::Services;
    pub const COUNT: u8 = 5;

    /// 1-based step number for display
    pub fn number(self) -> u8 {
        match self {
            WizardStep::Services => 1,
            WizardStep::Details => 2,
            WizardStep::Assets => 3,
            WizardStep::Contact => 4,
            WizardStep::Summary => 5,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Services => "Services",
            WizardStep::Details => "Details",
            WizardStep::Assets => "Existing assets",
            WizardStep::Contact => "Contact",
            WizardStep::Summary => "Summary",
        }
    }

    /// The following step, if any
    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Services => Some(WizardStep::Details),
            WizardStep::Details => Some(WizardStep::Assets),
            WizardStep::Assets => Some(WizardStep::Contact),
            WizardStep::Contact => Some(WizardStep::Summary),
            WizardStep::Summary => None,
        }
    }

    /// The previous step, if any. Going back is never gated.
    pub fn back(self) -> Option<WizardStep> {
        match self {
            WizardStep::Services => None,
            WizardStep::Details => Some(WizardStep::Services),
            WizardStep::Assets => Some(WizardStep::Details),
            WizardStep::Contact => Some(WizardStep::Assets),
            WizardStep::Summary => Some(WizardStep::Contact),
        }
    }
}

/// Whether the wizard may advance past `step` given the current plan.
///
/// - Services: at least one service selected.
/// - Details: every sub-option of every selected service has a choice.
///   Services without sub-options impose nothing.
/// - Assets: always (answers are optional).
/// - Contact: non-blank name and a well-formed email.
/// - Summary: terminal; never advances.
pub fn can_advance(step: WizardStep, plan: &QuotePlan, catalog: &ServiceCatalog) -> bool {
    match step {
        WizardStep::Services => plan.selection_count() > 0,
        WizardStep::Details => details_complete(plan, catalog),
        WizardStep::Assets => true,
        WizardStep::Contact => validate_contact(plan.contact()).is_empty(),
        WizardStep::Summary => false,
    }
}

/// Field-level messages for the contact step's failed submission
pub fn contact_errors(plan: &QuotePlan) -> ContactErrors {
    validate_contact(plan.contact())
}

fn details_complete(plan: &QuotePlan, catalog: &ServiceCatalog) -> bool {
    plan.selected_services().all(|id| {
        match catalog.service(id) {
            Some(service) => service
                .sub_options
                .iter()
                .all(|sub| plan.detail(id, &sub.id).is_some()),
            // Selected ids missing from the catalog can't be configured;
            // don't let them wedge the wizard
            None => true,
        }
    })
}
