//! Summary projection and plain-text export
//!
//! Totals are recomputed from the plan on every call, never stored. The
//! plain-text rendering is what gets printed and what the mail relay sends,
//! so its section order is part of the contract: timestamp, contact,
//! services with chosen sub-options, asset answers, totals, disclaimer.

use chrono::{DateTime, Utc};

use crate::quote::catalog::{PriceType, ServiceCatalog};
use crate::quote::plan::QuotePlan;

/// Selected services aggregated by price type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteTotals {
    pub one_time: u64,
    pub monthly: u64,
}

/// Sum selected services by price type. Order of selection is irrelevant.
pub fn totals(plan: &QuotePlan, catalog: &ServiceCatalog) -> QuoteTotals {
    let mut result = QuoteTotals::default();
    for id in plan.selected_services() {
        if let Some(service) = catalog.service(id) {
            match service.price_type {
                PriceType::OneTime => result.one_time += service.price,
                PriceType::Monthly => result.monthly += service.price,
            }
        }
    }
    result
}

/// `$3,000`-style whole-dollar formatting
pub fn format_usd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("${grouped}")
}

/// A service's price as displayed: `$3,000 (one-time)` or `$1,000/mo`
pub fn format_price(price: u64, price_type: PriceType) -> String {
    match price_type {
        PriceType::OneTime => format!("{} (one-time)", format_usd(price)),
        PriceType::Monthly => format!("{}/mo", format_usd(price)),
    }
}

fn or_dash(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { "-" } else { trimmed }
}

/// Deterministic plain-text serialization of the draft.
///
/// The timestamp is injected so callers (and tests) control it.
pub fn render_plain_text(
    plan: &QuotePlan,
    catalog: &ServiceCatalog,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    out.push_str("MERIDIAN STUDIO - PROJECT QUOTE\n");
    out.push_str(&format!(
        "Generated: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    let contact = plan.contact();
    out.push_str("CONTACT\n");
    out.push_str(&format!("Name:     {}\n", or_dash(&contact.full_name)));
    out.push_str(&format!("Email:    {}\n", or_dash(&contact.email)));
    out.push_str(&format!("Phone:    {}\n", or_dash(&contact.phone)));
    out.push_str(&format!("Company:  {}\n", or_dash(&contact.company)));
    out.push_str(&format!("Timeline: {}\n\n", or_dash(&contact.timeline)));

    out.push_str("SERVICES\n");
    // Catalog order keeps the export stable across selection orders
    for service in &catalog.services {
        if !plan.is_selected(&service.id) {
            continue;
        }
        out.push_str(&format!(
            "- {} - {}\n",
            service.name,
            format_price(service.price, service.price_type)
        ));
        for sub in &service.sub_options {
            if let Some(value) = plan.detail(&service.id, &sub.id) {
                out.push_str(&format!("    {}: {}\n", sub.label, value));
            }
        }
    }
    out.push('\n');

    let answered: Vec<_> = catalog
        .asset_questions
        .iter()
        .filter_map(|q| plan.asset_answer(&q.id).map(|a| (q, a)))
        .collect();
    if !answered.is_empty() {
        out.push_str("EXISTING ASSETS\n");
        for (question, answer) in answered {
            out.push_str(&format!("{} {}\n", question.prompt, answer));
        }
        out.push('\n');
    }

    let totals = totals(plan, catalog);
    out.push_str("TOTALS\n");
    out.push_str(&format!(
        "One-time: {} (one-time)\n",
        format_usd(totals.one_time)
    ));
    out.push_str(&format!("Monthly:  +{}/mo\n\n", format_usd(totals.monthly)));

    out.push_str("Estimate only; final pricing follows a scoping call.\n");
    out
}
