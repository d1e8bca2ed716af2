//! Error types for sitecraft.

use std::time::Duration;

use uuid::Uuid;

use crate::wizard::model::Field;
use crate::wizard::stage::Stage;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors talking to the website backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Backend did not respond within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Backend rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

/// Payment gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Payment gateway rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid response from payment gateway: {0}")]
    InvalidResponse(String),
}

/// Identity provider errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Identity provider request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Identity provider rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid response from identity provider: {0}")]
    InvalidResponse(String),
}

/// Why a submission was refused or failed.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Submission is only possible from the review stage (currently at {stage})")]
    NotAtReview { stage: Stage },

    #[error("Selections incomplete, missing: {}", join_fields(.missing))]
    Incomplete { missing: Vec<Field> },

    #[error("A submission is already in progress")]
    InFlight,

    #[error("Submission failed: {0}")]
    Backend(#[from] BackendError),
}

/// Session-level errors surfaced by the wizard manager.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Wizard session {id} not found")]
    SessionNotFound { id: Uuid },

    #[error("No plan selected yet")]
    PlanNotSelected,

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_lists_fields() {
        let err = SubmissionError::Incomplete {
            missing: vec![Field::DomainName, Field::Plan],
        };
        assert_eq!(
            err.to_string(),
            "Selections incomplete, missing: domain_name, plan"
        );
    }

    #[test]
    fn wizard_error_wraps_submission_transparently() {
        let err: WizardError = SubmissionError::InFlight.into();
        assert_eq!(err.to_string(), "A submission is already in progress");
    }
}
