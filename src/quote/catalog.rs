//! Service and pricing catalog
//!
//! Immutable reference data for the quote wizard. The built-in catalog
//! mirrors the site's published pricing; a JSON file can override it for
//! staging or custom engagements.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// How a service is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceType {
    OneTime,
    Monthly,
}

/// A configurable slot on a service (e.g. page count, CMS choice)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubOption {
    pub id: String,
    pub label: String,
    pub choices: Vec<String>,
}

/// One sellable service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogService {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Whole US dollars
    pub price: u64,
    pub price_type: PriceType,
    #[serde(default)]
    pub sub_options: Vec<SubOption>,
}

impl CatalogService {
    pub fn has_sub_options(&self) -> bool {
        !self.sub_options.is_empty()
    }
}

/// An optional question about what the client already has
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetQuestion {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
}

/// The full catalog: services plus asset questions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCatalog {
    pub services: Vec<CatalogService>,
    pub asset_questions: Vec<AssetQuestion>,
}

impl ServiceCatalog {
    /// The catalog shipped with the CLI
    pub fn builtin() -> Self {
        fn sub(id: &str, label: &str, choices: &[&str]) -> SubOption {
            SubOption {
                id: id.to_string(),
                label: label.to_string(),
                choices: choices.iter().map(|c| c.to_string()).collect(),
            }
        }

        fn service(
            id: &str,
            name: &str,
            category: &str,
            price: u64,
            price_type: PriceType,
            sub_options: Vec<SubOption>,
        ) -> CatalogService {
            CatalogService {
                id: id.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                price,
                price_type,
                sub_options,
            }
        }

        Self {
            services: vec![
                service(
                    "web-development",
                    "Website Development",
                    "Build",
                    3000,
                    PriceType::OneTime,
                    vec![
                        sub("pages", "Pages", &["1-5", "6-10", "11+"]),
                        sub("cms", "CMS", &["None", "Headless CMS", "WordPress"]),
                    ],
                ),
                service(
                    "ecommerce",
                    "E-commerce Store",
                    "Build",
                    4500,
                    PriceType::OneTime,
                    vec![
                        sub("platform", "Platform", &["Shopify", "WooCommerce", "Custom"]),
                        sub("products", "Catalog size", &["Up to 50", "51-500", "500+"]),
                    ],
                ),
                service(
                    "branding",
                    "Brand Identity",
                    "Build",
                    1500,
                    PriceType::OneTime,
                    vec![],
                ),
                service(
                    "seo",
                    "SEO",
                    "Grow",
                    1000,
                    PriceType::Monthly,
                    vec![sub("focus", "Focus", &["Local", "National", "E-commerce"])],
                ),
                service(
                    "content",
                    "Content Marketing",
                    "Grow",
                    800,
                    PriceType::Monthly,
                    vec![],
                ),
                service(
                    "care-plan",
                    "Hosting & Maintenance",
                    "Care",
                    200,
                    PriceType::Monthly,
                    vec![],
                ),
            ],
            asset_questions: vec![
                AssetQuestion {
                    id: "existing-site".to_string(),
                    prompt: "Do you have an existing website?".to_string(),
                    options: vec!["Yes".to_string(), "No".to_string(), "Partially".to_string()],
                },
                AssetQuestion {
                    id: "domain".to_string(),
                    prompt: "Do you already own a domain?".to_string(),
                    options: vec!["Yes".to_string(), "No".to_string()],
                },
                AssetQuestion {
                    id: "brand-assets".to_string(),
                    prompt: "Do you have brand assets (logo, colors, fonts)?".to_string(),
                    options: vec!["Yes".to_string(), "Some".to_string(), "No".to_string()],
                },
            ],
        }
    }

    /// Load a catalog override from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let catalog: ServiceCatalog = serde_json::from_str(&contents)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reject catalogs the wizard cannot safely drive
    fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            return Err(Error::Other("Catalog has no services".to_string()));
        }
        for service in &self.services {
            for sub in &service.sub_options {
                if sub.choices.is_empty() {
                    return Err(Error::Other(format!(
                        "Sub-option '{}' of '{}' has no choices",
                        sub.id, service.id
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn service(&self, id: &str) -> Option<&CatalogService> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn asset_question(&self, id: &str) -> Option<&AssetQuestion> {
        self.asset_questions.iter().find(|q| q.id == id)
    }
}
