//! Quote command implementation: the interactive five-step wizard

use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use dialoguer::{Input, MultiSelect, Select, theme::ColorfulTheme};
use indicatif::ProgressBar;

use crate::config::Config;
use crate::error::Result;
use crate::quote::{
    ContactField, PlanEvent, QuotePlan, ServiceCatalog, WizardStep, can_advance, contact_errors,
    render_plain_text, totals,
};
use crate::relay::{DeliveryStatus, QuoteEmail, RelayClient};

enum Nav {
    Next,
    Back,
    Quit,
}

/// Run the quote command
pub async fn run(catalog_path: Option<&Path>, config_path: Option<&str>) -> Result<()> {
    let catalog = match catalog_path {
        Some(path) => ServiceCatalog::load_from(path)?,
        None => ServiceCatalog::builtin(),
    };
    let config = super::load_config_lenient(config_path)?;

    println!("{}", "Meridian Studio - Project Quote Builder".bold().green());

    let mut plan = QuotePlan::new();
    let mut step = WizardStep::FIRST;

    loop {
        println!(
            "\n{}",
            format!("Step {}/{}: {}", step.number(), WizardStep::COUNT, step.title()).bold()
        );

        let nav = match step {
            WizardStep::Services => services_step(&mut plan, &catalog)?,
            WizardStep::Details => details_step(&mut plan, &catalog)?,
            WizardStep::Assets => assets_step(&mut plan, &catalog)?,
            WizardStep::Contact => contact_step(&mut plan)?,
            WizardStep::Summary => match summary_step(&mut plan, &catalog, &config).await? {
                SummaryOutcome::Nav(nav) => nav,
                SummaryOutcome::StartOver => {
                    plan.apply(PlanEvent::Reset);
                    step = WizardStep::FIRST;
                    continue;
                }
                SummaryOutcome::Done => break,
            },
        };

        match nav {
            Nav::Next => {
                if can_advance(step, &plan, &catalog) {
                    if let Some(next) = step.next() {
                        step = next;
                    }
                } else {
                    print_gate_reason(step, &plan);
                }
            }
            Nav::Back => {
                if let Some(back) = step.back() {
                    step = back;
                }
            }
            Nav::Quit => break,
        }
    }

    Ok(())
}

fn print_gate_reason(step: WizardStep, plan: &QuotePlan) {
    match step {
        WizardStep::Services => {
            println!("{}", "Select at least one service to continue.".red());
        }
        WizardStep::Details => {
            println!("{}", "Choose an option for each selected service.".red());
        }
        WizardStep::Contact => {
            let errors = contact_errors(plan);
            for message in [errors.full_name, errors.email].into_iter().flatten() {
                println!("{}", message.red());
            }
        }
        WizardStep::Assets | WizardStep::Summary => {}
    }
}

fn nav_prompt(step: WizardStep) -> Result<Nav> {
    let mut items = vec!["Next"];
    if step.back().is_some() {
        items.push("Back");
    }
    items.push("Quit");

    let choice = Select::with_theme(&ColorfulTheme::default())
        .items(&items)
        .default(0)
        .interact()?;

    Ok(match items[choice] {
        "Back" => Nav::Back,
        "Quit" => Nav::Quit,
        _ => Nav::Next,
    })
}

fn services_step(plan: &mut QuotePlan, catalog: &ServiceCatalog) -> Result<Nav> {
    let labels: Vec<String> = catalog
        .services
        .iter()
        .map(|s| {
            format!(
                "{} ({})",
                s.name,
                crate::quote::format_price(s.price, s.price_type)
            )
        })
        .collect();
    let defaults: Vec<bool> = catalog
        .services
        .iter()
        .map(|s| plan.is_selected(&s.id))
        .collect();

    let picked = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Which services do you need? (space to toggle)")
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    for (idx, service) in catalog.services.iter().enumerate() {
        let now_selected = picked.contains(&idx);
        if now_selected != plan.is_selected(&service.id) {
            plan.apply(PlanEvent::ServiceToggled(service.id.clone()));
        }
    }

    nav_prompt(WizardStep::Services)
}

fn details_step(plan: &mut QuotePlan, catalog: &ServiceCatalog) -> Result<Nav> {
    let mut asked_any = false;
    for service in &catalog.services {
        if !plan.is_selected(&service.id) || !service.has_sub_options() {
            continue;
        }
        asked_any = true;
        println!("{}", service.name.bold());
        for sub in &service.sub_options {
            let default = plan
                .detail(&service.id, &sub.id)
                .and_then(|value| sub.choices.iter().position(|c| c == value))
                .unwrap_or(0);
            let choice = Select::with_theme(&ColorfulTheme::default())
                .with_prompt(&sub.label)
                .items(&sub.choices)
                .default(default)
                .interact()?;
            plan.apply(PlanEvent::DetailChosen {
                service: service.id.clone(),
                option: sub.id.clone(),
                value: sub.choices[choice].clone(),
            });
        }
    }

    if !asked_any {
        println!("No extra details needed for the selected services.");
    }

    nav_prompt(WizardStep::Details)
}

fn assets_step(plan: &mut QuotePlan, catalog: &ServiceCatalog) -> Result<Nav> {
    for question in &catalog.asset_questions {
        let mut items: Vec<&str> = question.options.iter().map(String::as_str).collect();
        items.push("(skip)");
        let default = plan
            .asset_answer(&question.id)
            .and_then(|value| question.options.iter().position(|o| o == value))
            .unwrap_or(items.len() - 1);

        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(&question.prompt)
            .items(&items)
            .default(default)
            .interact()?;

        if choice < question.options.len() {
            plan.apply(PlanEvent::AssetAnswered {
                question: question.id.clone(),
                value: question.options[choice].clone(),
            });
        }
    }

    nav_prompt(WizardStep::Assets)
}

fn contact_step(plan: &mut QuotePlan) -> Result<Nav> {
    let fields = [
        (ContactField::FullName, "Name", plan.contact().full_name.clone(), false),
        (ContactField::Email, "Email", plan.contact().email.clone(), false),
        (ContactField::Phone, "Phone (optional)", plan.contact().phone.clone(), true),
        (ContactField::Company, "Company (optional)", plan.contact().company.clone(), true),
        (
            ContactField::Timeline,
            "Timeline (optional)",
            plan.contact().timeline.clone(),
            true,
        ),
    ];

    for (field, prompt, current, optional) in fields {
        let value: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(optional || current.is_empty())
            .with_initial_text(current)
            .interact_text()?;
        plan.apply(PlanEvent::ContactUpdated { field, value });
    }

    let errors = contact_errors(plan);
    for message in [errors.full_name, errors.email].into_iter().flatten() {
        println!("{}", message.red());
    }

    nav_prompt(WizardStep::Contact)
}

enum SummaryOutcome {
    Nav(Nav),
    StartOver,
    Done,
}

async fn summary_step(
    plan: &mut QuotePlan,
    catalog: &ServiceCatalog,
    config: &Config,
) -> Result<SummaryOutcome> {
    let summary = render_plain_text(plan, catalog, Utc::now());
    println!("\n{summary}");

    let projected = totals(plan, catalog);
    log::debug!(
        "Summary totals: one-time {} / monthly {}",
        projected.one_time,
        projected.monthly
    );

    let mut delivery = DeliveryStatus::default();

    loop {
        let items = [
            "Email me this quote",
            "Print summary",
            "Schedule a call",
            "Back",
            "Start over",
            "Done",
        ];
        let choice = Select::with_theme(&ColorfulTheme::default())
            .items(&items)
            .default(0)
            .interact()?;

        match items[choice] {
            "Email me this quote" => {
                if !delivery.can_send() {
                    continue;
                }
                match email_quote(plan, &summary, config, &mut delivery).await {
                    Ok(()) => {}
                    Err(err) => println!("{}", err.to_string().red()),
                }
            }
            "Print summary" => println!("\n{summary}"),
            "Schedule a call" => match config.require_scheduling_url() {
                Ok(url) => println!("Book a call here: {}", url.cyan()),
                Err(_) => println!(
                    "No scheduling URL configured. Run {} to set one.",
                    "offsite init".cyan()
                ),
            },
            "Back" => return Ok(SummaryOutcome::Nav(Nav::Back)),
            "Start over" => return Ok(SummaryOutcome::StartOver),
            _ => return Ok(SummaryOutcome::Done),
        }
    }
}

async fn email_quote(
    plan: &QuotePlan,
    summary: &str,
    config: &Config,
    delivery: &mut DeliveryStatus,
) -> Result<()> {
    let relay_url = config.require_relay_url()?;
    let client = RelayClient::new(relay_url, config.relay_token.as_deref())?;
    let email = QuoteEmail {
        name: plan.contact().full_name.clone(),
        email: plan.contact().email.clone(),
        summary: summary.to_string(),
    };

    delivery.start();
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Sending your quote...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let outcome = client.send(&email).await;
    spinner.finish_and_clear();
    delivery.finish(&outcome);

    match &outcome {
        Ok(()) => println!("{} Quote sent to {}", "✓".green(), email.email),
        Err(err) => println!("{} {}", "✗".red(), err.to_string().red()),
    }

    // The draft survives a failed send; the caller keeps the plan as-is.
    Ok(())
}
