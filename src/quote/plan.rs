//! The draft quote plan and its reducer
//!
//! The plan is the single mutable aggregate of a wizard session. Step
//! components never touch it directly; they emit [`PlanEvent`]s and the
//! reducer applies them, which keeps the cleanup invariant (no detail entries
//! for deselected services) in one place.

use std::collections::{BTreeMap, BTreeSet};

/// Contact details collected on step 4
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub timeline: String,
}

/// Which contact field an event targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    FullName,
    Email,
    Phone,
    Company,
    Timeline,
}

/// Intent events emitted by the wizard steps
#[derive(Debug, Clone)]
pub enum PlanEvent {
    /// Select the service if unselected, deselect (and drop its details)
    /// otherwise
    ServiceToggled(String),
    /// Record a sub-option choice for a selected service
    DetailChosen {
        service: String,
        option: String,
        value: String,
    },
    /// Answer (or re-answer) an asset question
    AssetAnswered { question: String, value: String },
    /// Update one contact field
    ContactUpdated { field: ContactField, value: String },
    /// Full restart: clear everything
    Reset,
}

/// The accumulating draft for one wizard session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotePlan {
    selected: BTreeSet<String>,
    details: BTreeMap<String, BTreeMap<String, String>>,
    assets: BTreeMap<String, String>,
    contact: Contact,
}

impl QuotePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. Never fails; invalid events are ignored with a log.
    pub fn apply(&mut self, event: PlanEvent) {
        match event {
            PlanEvent::ServiceToggled(id) => {
                if self.selected.remove(&id) {
                    // Deselection deletes details rather than leaving them stale
                    self.details.remove(&id);
                } else {
                    self.selected.insert(id);
                }
            }
            PlanEvent::DetailChosen {
                service,
                option,
                value,
            } => {
                if !self.selected.contains(&service) {
                    log::debug!("Ignoring detail for unselected service {}", service);
                    return;
                }
                self.details.entry(service).or_default().insert(option, value);
            }
            PlanEvent::AssetAnswered { question, value } => {
                self.assets.insert(question, value);
            }
            PlanEvent::ContactUpdated { field, value } => match field {
                ContactField::FullName => self.contact.full_name = value,
                ContactField::Email => self.contact.email = value,
                ContactField::Phone => self.contact.phone = value,
                ContactField::Company => self.contact.company = value,
                ContactField::Timeline => self.contact.timeline = value,
            },
            PlanEvent::Reset => *self = Self::default(),
        }
    }

    pub fn selected_services(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn is_selected(&self, service: &str) -> bool {
        self.selected.contains(service)
    }

    pub fn selection_count(&self) -> usize {
        self.selected.len()
    }

    /// The chosen value for a service's sub-option, if any
    pub fn detail(&self, service: &str, option: &str) -> Option<&str> {
        self.details
            .get(service)?
            .get(option)
            .map(String::as_str)
    }

    pub fn asset_answer(&self, question: &str) -> Option<&str> {
        self.assets.get(question).map(String::as_str)
    }

    pub fn asset_answers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assets.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }
}

/// Field-level validation messages for the contact step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactErrors {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl ContactErrors {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.email.is_none()
    }
}

/// Validate the contact block, returning display-ready messages
pub fn validate_contact(contact: &Contact) -> ContactErrors {
    let mut errors = ContactErrors::default();

    if contact.full_name.trim().is_empty() {
        errors.full_name = Some("Name is required".to_string());
    }

    if contact.email.trim().is_empty() {
        errors.email = Some("Email is required".to_string());
    } else if !email_is_valid(contact.email.trim()) {
        errors.email = Some("Please enter a valid email".to_string());
    }

    errors
}

/// Accept the standard `local@domain.tld` shape, nothing fancier
pub fn email_is_valid(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !host.starts_with('.') && tld.len() >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toggled(id: &str) -> PlanEvent {
        PlanEvent::ServiceToggled(id.to_string())
    }

    fn detail(service: &str, option: &str, value: &str) -> PlanEvent {
        PlanEvent::DetailChosen {
            service: service.to_string(),
            option: option.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_toggle_selects_then_deselects() {
        let mut plan = QuotePlan::new();
        plan.apply(toggled("seo"));
        assert!(plan.is_selected("seo"));

        plan.apply(toggled("seo"));
        assert!(!plan.is_selected("seo"));
        assert_eq!(plan.selection_count(), 0);
    }

    #[test]
    fn test_deselect_drops_details() {
        let mut plan = QuotePlan::new();
        plan.apply(toggled("web-development"));
        plan.apply(detail("web-development", "pages", "6-10"));
        plan.apply(detail("web-development", "cms", "Headless CMS"));
        assert_eq!(plan.detail("web-development", "pages"), Some("6-10"));

        plan.apply(toggled("web-development"));

        // No stale detail entries survive deselection
        assert!(plan.detail("web-development", "pages").is_none());
        assert!(plan.detail("web-development", "cms").is_none());
    }

    #[test]
    fn test_detail_for_unselected_service_ignored() {
        let mut plan = QuotePlan::new();
        plan.apply(detail("seo", "focus", "Local"));
        assert!(plan.detail("seo", "focus").is_none());
    }

    #[test]
    fn test_reselect_starts_with_blank_details() {
        let mut plan = QuotePlan::new();
        plan.apply(toggled("seo"));
        plan.apply(detail("seo", "focus", "Local"));
        plan.apply(toggled("seo"));
        plan.apply(toggled("seo"));
        assert!(plan.is_selected("seo"));
        assert!(plan.detail("seo", "focus").is_none());
    }

    #[test]
    fn test_asset_answers_can_be_revised() {
        let mut plan = QuotePlan::new();
        plan.apply(PlanEvent::AssetAnswered {
            question: "domain".to_string(),
            value: "No".to_string(),
        });
        plan.apply(PlanEvent::AssetAnswered {
            question: "domain".to_string(),
            value: "Yes".to_string(),
        });
        assert_eq!(plan.asset_answer("domain"), Some("Yes"));
    }

    #[test]
    fn test_contact_updates_by_field() {
        let mut plan = QuotePlan::new();
        plan.apply(PlanEvent::ContactUpdated {
            field: ContactField::FullName,
            value: "Jane Doe".to_string(),
        });
        plan.apply(PlanEvent::ContactUpdated {
            field: ContactField::Email,
            value: "jane@example.com".to_string(),
        });
        assert_eq!(plan.contact().full_name, "Jane Doe");
        assert_eq!(plan.contact().email, "jane@example.com");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut plan = QuotePlan::new();
        plan.apply(toggled("seo"));
        plan.apply(detail("seo", "focus", "Local"));
        plan.apply(PlanEvent::ContactUpdated {
            field: ContactField::Email,
            value: "jane@example.com".to_string(),
        });

        plan.apply(PlanEvent::Reset);

        assert_eq!(plan.selection_count(), 0);
        assert!(plan.asset_answers().next().is_none());
        assert_eq!(plan.contact(), &Contact::default());
    }

    #[test]
    fn test_validate_contact_empty_fields() {
        let errors = validate_contact(&Contact::default());
        assert_eq!(errors.full_name.as_deref(), Some("Name is required"));
        assert_eq!(errors.email.as_deref(), Some("Email is required"));
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_validate_contact_bad_email() {
        let contact = Contact {
            full_name: "Jane Doe".to_string(),
            email: "not-an-email".to_string(),
            ..Default::default()
        };
        let errors = validate_contact(&contact);
        assert!(errors.full_name.is_none());
        assert_eq!(errors.email.as_deref(), Some("Please enter a valid email"));
    }

    #[test]
    fn test_validate_contact_ok() {
        let contact = Contact {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            ..Default::default()
        };
        assert!(validate_contact(&contact).is_empty());
    }

    #[test]
    fn test_email_shapes() {
        assert!(email_is_valid("jane@example.com"));
        assert!(email_is_valid("jane.doe+quotes@mail.example.co"));

        assert!(!email_is_valid("jane"));
        assert!(!email_is_valid("jane@"));
        assert!(!email_is_valid("@example.com"));
        assert!(!email_is_valid("jane@example"));
        assert!(!email_is_valid("jane@@example.com"));
        assert!(!email_is_valid("jane doe@example.com"));
        assert!(!email_is_valid("jane@example.c"));
    }
}
