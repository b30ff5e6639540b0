//! Init command implementation

use colored::Colorize;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

use crate::config::Config;
use crate::error::Result;

/// Run the init command
pub async fn run(config_path: Option<&str>) -> Result<()> {
    println!("{}", "Welcome to offsite!".bold().green());
    println!("Let's set up your site configuration.\n");

    let existing = Config::load_at(config_path).unwrap_or_default();

    let site_url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Site URL")
        .default(existing.site_url.clone())
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            reqwest::Url::parse(input)
                .map(|_| ())
                .map_err(|e| format!("Invalid URL: {e}"))
        })
        .interact_text()?;

    let relay_default = existing
        .relay_url
        .clone()
        .unwrap_or_else(|| format!("{}/api/quote-email", site_url.trim_end_matches('/')));
    let relay_url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Quote mail-relay URL")
        .default(relay_default)
        .interact_text()?;

    let scheduling_url: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Scheduling URL (leave empty to skip)")
        .allow_empty(true)
        .default(existing.scheduling_url.clone().unwrap_or_default())
        .interact_text()?;

    let config = Config {
        site_url,
        relay_url: Some(relay_url),
        relay_token: existing.relay_token.clone(),
        scheduling_url: if scheduling_url.trim().is_empty() {
            None
        } else {
            Some(scheduling_url)
        },
        preferences: existing.preferences.clone(),
    };

    config.save_at(config_path)?;

    let path = Config::resolve_path(config_path)?;
    println!(
        "\n{} Configuration saved to: {}",
        "✓".green(),
        path.display()
    );

    let warm_now = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Precache the site shell for offline browsing now?")
        .default(true)
        .interact()?;

    if warm_now {
        super::warm::run(config_path, None).await?;
    } else {
        println!("\n{}", "You're all set! Try running:".bold());
        println!("  {} - Precache the site shell", "offsite warm".cyan());
        println!("  {} - Build a project quote", "offsite quote".cyan());
    }

    Ok(())
}
