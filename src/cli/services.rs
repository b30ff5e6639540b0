//! Services command implementation

use std::path::Path;

use tabled::Tabled;

use crate::error::Result;
use crate::output::table::format_table;
use crate::quote::{ServiceCatalog, format_price};

use super::OutputFormat;

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "SERVICE")]
    name: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "PRICE")]
    price: String,
    #[tabled(rename = "OPTIONS")]
    options: String,
}

/// Run the services command
pub fn run(catalog_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let catalog = match catalog_path {
        Some(path) => ServiceCatalog::load_from(path)?,
        None => ServiceCatalog::builtin(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
        OutputFormat::Table => {
            let rows: Vec<ServiceRow> = catalog
                .services
                .iter()
                .map(|service| ServiceRow {
                    name: service.name.clone(),
                    category: service.category.clone(),
                    price: format_price(service.price, service.price_type),
                    options: if service.has_sub_options() {
                        service.sub_options.len().to_string()
                    } else {
                        "-".to_string()
                    },
                })
                .collect();
            println!("{}", format_table(&rows));
        }
    }

    Ok(())
}
