//! Wizard session: the owned context bundling the selections store, stage
//! sequencer, notification log and submission guard for one user's run
//! through the wizard.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::backend::{SiteBackend, SubmissionReceipt, SubmissionRequest};
use crate::error::{BackendError, PaymentError, SubmissionError};
use crate::notify::{Notification, Notifications};
use crate::payment::{OrderStatus, outcome_notification};

use super::model::{Field, Selections, SelectionsUpdate};
use super::stage::{Stage, StageIndicator, StageSequencer};
use super::store::SelectionsStore;

/// Returned to the user after the backend accepts a submission.
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub domain_name: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_id: Option<String>,
}

impl Confirmation {
    fn for_domain(domain_name: &str, receipt: SubmissionReceipt) -> Self {
        Self {
            domain_name: domain_name.to_string(),
            message: format!(
                "Your website at {domain_name} has been submitted for approval. \
                 Expect a response within one to three business days"
            ),
            website_id: receipt.website_id,
        }
    }
}

/// Serializable view of a session for clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub id: Uuid,
    pub stage: Stage,
    pub stage_index: usize,
    pub stages: Vec<StageIndicator>,
    pub selections: Selections,
    pub missing_fields: Vec<Field>,
    pub can_advance: bool,
    pub ready_to_submit: bool,
    pub submitting: bool,
    pub created_at: DateTime<Utc>,
}

/// One run through the new-website wizard.
#[derive(Debug)]
pub struct WizardSession {
    id: Uuid,
    owner_uid: String,
    store: SelectionsStore,
    sequencer: StageSequencer,
    notifications: Notifications,
    submitting: bool,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl WizardSession {
    pub fn new(owner_uid: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_uid: owner_uid.into(),
            store: SelectionsStore::new(),
            sequencer: StageSequencer::new(),
            notifications: Notifications::new(),
            submitting: false,
            created_at: now,
            last_active: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_uid(&self) -> &str {
        &self.owner_uid
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn selections(&self) -> &Selections {
        self.store.get()
    }

    pub fn store(&self) -> &SelectionsStore {
        &self.store
    }

    pub fn stage(&self) -> Stage {
        self.sequencer.active()
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        self.touch();
        &mut self.notifications
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    // ── Selections ──────────────────────────────────────────────────

    /// Merge an update. Refused while a submission is in flight.
    pub fn update(&mut self, update: SelectionsUpdate) -> Result<(), SubmissionError> {
        self.ensure_idle()?;
        self.touch();
        self.store.update(update);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), SubmissionError> {
        self.ensure_idle()?;
        self.touch();
        self.store.reset();
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), SubmissionError> {
        if self.submitting {
            return Err(SubmissionError::InFlight);
        }
        Ok(())
    }

    // ── Navigation ──────────────────────────────────────────────────
    //
    // The stage is pinned while a submission is in flight.

    pub fn can_advance(&self) -> bool {
        !self.submitting && self.sequencer.can_advance(self.store.get())
    }

    pub fn advance(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        self.touch();
        let moved = self.sequencer.advance(self.store.get());
        if moved {
            info!(session_id = %self.id, stage = %self.stage(), "Wizard advanced");
        }
        moved
    }

    pub fn retreat(&mut self) -> bool {
        if self.submitting {
            return false;
        }
        self.touch();
        self.sequencer.retreat()
    }

    pub fn jump_to(&mut self, stage: Stage) -> bool {
        if self.submitting {
            return false;
        }
        self.touch();
        self.sequencer.jump_to(stage)
    }

    /// Whether the submit action is currently available.
    pub fn is_ready_to_submit(&self) -> bool {
        self.sequencer.is_terminal() && self.store.get().is_ready_for_submission() && !self.submitting
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Check submission preconditions, raise the in-flight flag and package
    /// the request. Pair with [`finish_submission`](Self::finish_submission).
    pub fn begin_submission(&mut self) -> Result<SubmissionRequest, SubmissionError> {
        self.touch();
        if !self.sequencer.is_terminal() {
            return Err(SubmissionError::NotAtReview { stage: self.stage() });
        }
        if self.submitting {
            return Err(SubmissionError::InFlight);
        }
        let selections = self
            .store
            .get()
            .complete()
            .map_err(|missing| SubmissionError::Incomplete { missing })?;

        self.submitting = true;
        info!(session_id = %self.id, domain = %selections.domain_name, "Submitting website");
        Ok(SubmissionRequest {
            owner_uid: self.owner_uid.clone(),
            selections,
        })
    }

    /// Lower the in-flight flag and record the outcome exactly once.
    /// The confirmation names the domain that was actually sent. Selections
    /// and stage are left untouched either way.
    pub fn finish_submission(
        &mut self,
        request: &SubmissionRequest,
        result: Result<SubmissionReceipt, BackendError>,
    ) -> Result<Confirmation, SubmissionError> {
        match result {
            Ok(receipt) => {
                self.touch();
                self.submitting = false;
                let confirmation = Confirmation::for_domain(&request.selections.domain_name, receipt);
                self.notifications.success(confirmation.message.clone());
                Ok(confirmation)
            }
            Err(e) => {
                self.abort_submission(&e);
                Err(SubmissionError::Backend(e))
            }
        }
    }

    /// Lower the in-flight flag after a failed submission and tell the user.
    pub fn abort_submission(&mut self, error: &BackendError) {
        self.touch();
        self.submitting = false;
        warn!(session_id = %self.id, error = %error, "Website submission failed");
        self.notifications
            .error(format!("We could not submit your website: {error}"));
    }

    /// Submit in one step when the caller owns the session exclusively.
    pub async fn submit(
        &mut self,
        backend: &dyn SiteBackend,
        identity: &UserIdentity,
    ) -> Result<Confirmation, SubmissionError> {
        let request = self.begin_submission()?;
        let result = backend.submit(&request, identity).await;
        self.finish_submission(&request, result)
    }

    // ── Payment ─────────────────────────────────────────────────────

    /// Record the user-facing outcome of a payment confirmation.
    pub fn record_payment_outcome(
        &mut self,
        result: &Result<OrderStatus, PaymentError>,
    ) -> Option<Notification> {
        let (level, message) = outcome_notification(result)?;
        Some(self.notifications_mut().push(level, message))
    }

    pub fn status(&self) -> SessionStatus {
        let selections = self.store.snapshot();
        SessionStatus {
            id: self.id,
            stage: self.stage(),
            stage_index: self.stage().index(),
            stages: self.sequencer.indicators(),
            missing_fields: selections.missing_fields(),
            can_advance: self.can_advance(),
            ready_to_submit: self.is_ready_to_submit(),
            submitting: self.submitting,
            selections,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::backend::{Website, WebsiteStatus};
    use crate::notify::NotificationLevel;
    use crate::wizard::model::{ContentSource, Plan, WebsiteType};

    /// Backend stub that records requests and answers with a canned result.
    struct StubBackend {
        fail: bool,
        requests: Mutex<Vec<SubmissionRequest>>,
    }

    impl StubBackend {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SiteBackend for StubBackend {
        async fn submit(
            &self,
            request: &SubmissionRequest,
            _identity: &UserIdentity,
        ) -> Result<SubmissionReceipt, BackendError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                Err(BackendError::Rejected {
                    status: 500,
                    body: "down".into(),
                })
            } else {
                Ok(SubmissionReceipt {
                    website_id: Some("w-42".into()),
                })
            }
        }

        async fn list_websites(
            &self,
            _identity: &UserIdentity,
            _status: WebsiteStatus,
        ) -> Result<Vec<Website>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn fill_all(session: &mut WizardSession) {
        session
            .update(
                SelectionsUpdate::default()
                    .theme("modern")
                    .website_type(WebsiteType::Blog)
                    .description("Weekly cooking notes")
                    .content_source(ContentSource::UserProvided)
                    .domain_name("example.com")
                    .plan(Plan::Basic),
            )
            .unwrap();
    }

    fn at_review() -> WizardSession {
        let mut session = WizardSession::new("user-1");
        fill_all(&mut session);
        while session.advance() {}
        assert_eq!(session.stage(), Stage::Review);
        session
    }

    fn identity() -> UserIdentity {
        UserIdentity::new("user-1", "token")
    }

    #[test]
    fn advance_requires_theme() {
        let mut session = WizardSession::new("user-1");
        assert!(!session.advance());
        assert_eq!(session.stage(), Stage::Theme);

        session.update(SelectionsUpdate::default().theme("modern")).unwrap();
        assert!(session.advance());
        assert_eq!(session.stage().index(), 1);
    }

    #[test]
    fn readiness_tracks_domain_name() {
        let mut session = WizardSession::new("user-1");
        session
            .update(
                SelectionsUpdate::default()
                    .theme("modern")
                    .website_type(WebsiteType::Business)
                    .description("Shop")
                    .content_source(ContentSource::Generated)
                    .domain_name(""),
            )
            .unwrap();
        for _ in 0..4 {
            assert!(session.advance());
        }
        assert_eq!(session.stage(), Stage::Domain);
        assert!(!session.can_advance());
        assert!(!session.selections().is_ready_for_submission());

        session.update(SelectionsUpdate::default().domain_name("example.com")).unwrap();
        assert!(session.can_advance());
        assert!(Field::DomainName.is_filled(session.selections()));
    }

    #[test]
    fn begin_submission_refused_before_review() {
        let mut session = WizardSession::new("user-1");
        fill_all(&mut session);
        let err = session.begin_submission().unwrap_err();
        assert!(matches!(err, SubmissionError::NotAtReview { stage: Stage::Theme }));
        assert!(!session.is_submitting());
    }

    #[test]
    fn begin_submission_refused_when_incomplete() {
        let mut session = at_review();
        session.update(SelectionsUpdate::default().domain_name("  ")).unwrap();
        match session.begin_submission().unwrap_err() {
            SubmissionError::Incomplete { missing } => assert_eq!(missing, vec![Field::DomainName]),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn session_is_frozen_while_in_flight() {
        let mut session = at_review();
        session.begin_submission().unwrap();

        assert!(matches!(
            session.update(SelectionsUpdate::default().domain_name("other.org")),
            Err(SubmissionError::InFlight)
        ));
        assert!(matches!(session.reset(), Err(SubmissionError::InFlight)));
        assert!(!session.retreat());
        assert!(!session.jump_to(Stage::Theme));
        assert_eq!(session.stage(), Stage::Review);
        assert_eq!(session.selections().domain_name.as_deref(), Some("example.com"));
    }

    #[test]
    fn confirmation_names_the_submitted_domain() {
        let mut session = at_review();
        let mut request = session.begin_submission().unwrap();
        request.selections.domain_name = "sent.example".to_string();

        let confirmation = session
            .finish_submission(&request, Ok(SubmissionReceipt::default()))
            .unwrap();
        assert_eq!(confirmation.domain_name, "sent.example");
        assert!(confirmation.message.starts_with("Your website at sent.example"));
    }

    #[test]
    fn abort_lowers_flag_and_notifies() {
        let mut session = at_review();
        session.begin_submission().unwrap();
        session.abort_submission(&BackendError::InvalidResponse("gone".into()));

        assert!(!session.is_submitting());
        assert_eq!(session.notifications().count_level(NotificationLevel::Error), 1);
        assert!(session.retreat());
    }

    #[test]
    fn second_begin_is_refused_while_in_flight() {
        let mut session = at_review();
        let request = session.begin_submission().unwrap();
        assert_eq!(request.owner_uid, "user-1");
        assert!(session.is_submitting());
        assert!(!session.is_ready_to_submit());
        assert!(matches!(
            session.begin_submission().unwrap_err(),
            SubmissionError::InFlight
        ));
    }

    #[tokio::test]
    async fn successful_submission_confirms_domain() {
        let mut session = at_review();
        let backend = StubBackend::new(false);

        let confirmation = session.submit(&backend, &identity()).await.unwrap();
        assert_eq!(confirmation.domain_name, "example.com");
        assert!(confirmation.message.contains("Your website at example.com"));
        assert_eq!(confirmation.website_id.as_deref(), Some("w-42"));

        assert_eq!(session.notifications().count_level(NotificationLevel::Success), 1);
        assert!(!session.is_submitting());
        assert_eq!(backend.requests.lock().unwrap()[0].selections.plan, Plan::Basic);
    }

    #[tokio::test]
    async fn failed_submission_keeps_state_and_notifies_once() {
        let mut session = at_review();
        let before = session.selections().clone();
        let backend = StubBackend::new(true);

        let err = session.submit(&backend, &identity()).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Backend(_)));

        assert_eq!(session.selections(), &before);
        assert_eq!(session.stage(), Stage::Review);
        assert!(!session.is_submitting());
        assert_eq!(session.notifications().len(), 1);
        assert_eq!(session.notifications().count_level(NotificationLevel::Error), 1);

        // The user may retry by hand.
        assert!(session.is_ready_to_submit());
    }

    #[test]
    fn payment_outcome_records_notification() {
        let mut session = WizardSession::new("user-1");
        let n = session.record_payment_outcome(&Ok(OrderStatus::Approved)).unwrap();
        assert_eq!(n.level, NotificationLevel::Success);
        assert!(session.record_payment_outcome(&Ok(OrderStatus::Created)).is_none());
        assert_eq!(session.notifications().len(), 1);
    }

    #[test]
    fn status_snapshot() {
        let mut session = WizardSession::new("user-1");
        session.update(SelectionsUpdate::default().theme("modern")).unwrap();
        let status = session.status();
        assert_eq!(status.stage, Stage::Theme);
        assert_eq!(status.stage_index, 0);
        assert!(status.can_advance);
        assert!(!status.ready_to_submit);
        assert_eq!(status.missing_fields.len(), 5);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["stage"], "theme");
        assert_eq!(json["selections"]["theme"], "modern");
        assert_eq!(json["stages"].as_array().unwrap().len(), 7);
    }
}
