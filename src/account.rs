//! Account settings: validation of personal-information edits.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([\.-]?\w+)*@\w+([\.-]?\w+)*(\.\w{2,3})+$").expect("valid email regex")
});

/// International format, e.g. `+254 712 345 678`.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+(?:[0-9] ?){6,14}[0-9]$").expect("valid phone regex"));

/// Personal-information form. Every field is optional; only present fields
/// are validated and sent on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl ProfileUpdate {
    /// "First Last", or `None` when neither name part was supplied.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    pub fn is_empty(&self) -> bool {
        self.display_name().is_none() && self.email.is_none() && self.phone_number.is_none()
    }

    /// Check every present field. Returns all problems at once.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if let Some(ref email) = self.email {
            if !EMAIL_RE.is_match(email.trim()) {
                errors.push(FieldError {
                    field: "email",
                    message: "Email is invalid or incomplete",
                });
            }
        }

        if let Some(ref phone) = self.phone_number {
            if !PHONE_RE.is_match(phone.trim()) {
                errors.push(FieldError {
                    field: "phone_number",
                    message: "Enter a valid phone number in international format (+254...)",
                });
            }
        }

        if self.is_empty() {
            errors.push(FieldError {
                field: "profile",
                message: "Nothing to update",
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(email: Option<&str>, phone: Option<&str>) -> ProfileUpdate {
        ProfileUpdate {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: email.map(String::from),
            phone_number: phone.map(String::from),
        }
    }

    #[test]
    fn display_name_joins_parts() {
        assert_eq!(update(None, None).display_name().as_deref(), Some("Ada Lovelace"));

        let only_last = ProfileUpdate {
            last_name: Some(" Hopper ".into()),
            ..Default::default()
        };
        assert_eq!(only_last.display_name().as_deref(), Some("Hopper"));
        assert!(ProfileUpdate::default().display_name().is_none());
    }

    #[test]
    fn accepts_valid_contact_details() {
        assert!(update(Some("ada@example.com"), Some("+254 712 345 678")).validate().is_ok());
        assert!(update(Some("first.last@mail.example.org"), Some("+14155550100")).validate().is_ok());
    }

    #[test]
    fn rejects_bad_email() {
        let errors = update(Some("not-an-email"), None).validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
    }

    #[test]
    fn rejects_bad_phone() {
        let errors = update(None, Some("0712345678")).validate().unwrap_err();
        assert_eq!(errors[0].field, "phone_number");

        let too_short = update(None, Some("+12345")).validate().unwrap_err();
        assert_eq!(too_short[0].field, "phone_number");
    }

    #[test]
    fn reports_all_problems_together() {
        let errors = update(Some("x@"), Some("12")).validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["email", "phone_number"]);
    }

    #[test]
    fn empty_update_is_rejected() {
        let errors = ProfileUpdate::default().validate().unwrap_err();
        assert_eq!(errors[0].field, "profile");
    }
}
