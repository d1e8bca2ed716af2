//! WizardManager: registry of live wizard sessions and orchestration of the
//! calls that leave the session (submission, payment).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::backend::SiteBackend;
use crate::config::PlanPricing;
use crate::error::{BackendError, SubmissionError, WizardError};
use crate::notify::Notification;
use crate::payment::{OrderStatus, PAYMENT_FAILED_MESSAGE, PaymentGateway, PaymentOrder};

use super::model::SelectionsUpdate;
use super::session::{Confirmation, SessionStatus, WizardSession};
use super::stage::Stage;

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<WizardSession>>;

type SessionMap = Arc<RwLock<HashMap<Uuid, SessionHandle>>>;

/// Result of a navigation request. Refusal is not an error.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Transition {
    pub moved: bool,
    pub session: SessionStatus,
}

/// Owns every live wizard session and the collaborators they call out to.
pub struct WizardManager {
    sessions: SessionMap,
    backend: Arc<dyn SiteBackend>,
    payments: Arc<dyn PaymentGateway>,
    pricing: PlanPricing,
}

impl WizardManager {
    pub fn new(
        backend: Arc<dyn SiteBackend>,
        payments: Arc<dyn PaymentGateway>,
        pricing: PlanPricing,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            backend,
            payments,
            pricing,
        })
    }

    pub fn backend(&self) -> &Arc<dyn SiteBackend> {
        &self.backend
    }

    /// Start a fresh wizard for `owner`.
    pub async fn create(&self, owner: &UserIdentity) -> SessionStatus {
        let session = WizardSession::new(owner.uid.clone());
        let id = session.id();
        let status = session.status();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        info!(session_id = %id, uid = %owner.uid, "Wizard session created");
        status
    }

    /// Look up a session, hiding sessions that belong to someone else.
    async fn handle(&self, id: Uuid, owner: &UserIdentity) -> Result<SessionHandle, WizardError> {
        let handle = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(WizardError::SessionNotFound { id })?;

        if handle.lock().await.owner_uid() != owner.uid {
            debug!(session_id = %id, uid = %owner.uid, "Session requested by non-owner");
            return Err(WizardError::SessionNotFound { id });
        }
        Ok(handle)
    }

    pub async fn status(&self, id: Uuid, owner: &UserIdentity) -> Result<SessionStatus, WizardError> {
        let handle = self.handle(id, owner).await?;
        let session = handle.lock().await;
        Ok(session.status())
    }

    pub async fn update_selections(
        &self,
        id: Uuid,
        owner: &UserIdentity,
        update: SelectionsUpdate,
    ) -> Result<SessionStatus, WizardError> {
        let handle = self.handle(id, owner).await?;
        let mut session = handle.lock().await;
        session.update(update)?;
        Ok(session.status())
    }

    pub async fn reset_selections(
        &self,
        id: Uuid,
        owner: &UserIdentity,
    ) -> Result<SessionStatus, WizardError> {
        let handle = self.handle(id, owner).await?;
        let mut session = handle.lock().await;
        session.reset()?;
        Ok(session.status())
    }

    pub async fn advance(&self, id: Uuid, owner: &UserIdentity) -> Result<Transition, WizardError> {
        self.navigate(id, owner, |s| s.advance()).await
    }

    pub async fn retreat(&self, id: Uuid, owner: &UserIdentity) -> Result<Transition, WizardError> {
        self.navigate(id, owner, |s| s.retreat()).await
    }

    pub async fn jump_to(
        &self,
        id: Uuid,
        owner: &UserIdentity,
        stage: Stage,
    ) -> Result<Transition, WizardError> {
        self.navigate(id, owner, |s| s.jump_to(stage)).await
    }

    async fn navigate<F>(&self, id: Uuid, owner: &UserIdentity, step: F) -> Result<Transition, WizardError>
    where
        F: FnOnce(&mut WizardSession) -> bool,
    {
        let handle = self.handle(id, owner).await?;
        let mut session = handle.lock().await;
        let moved = step(&mut session);
        Ok(Transition {
            moved,
            session: session.status(),
        })
    }

    pub async fn notifications(
        &self,
        id: Uuid,
        owner: &UserIdentity,
    ) -> Result<Vec<Notification>, WizardError> {
        let handle = self.handle(id, owner).await?;
        let session = handle.lock().await;
        Ok(session.notifications().all().to_vec())
    }

    /// Remove one notification. Returns whether it existed.
    pub async fn dismiss_notification(
        &self,
        id: Uuid,
        owner: &UserIdentity,
        notification_id: Uuid,
    ) -> Result<bool, WizardError> {
        let handle = self.handle(id, owner).await?;
        let dismissed = handle
            .lock()
            .await
            .notifications_mut()
            .dismiss(notification_id);
        Ok(dismissed)
    }

    /// Discard a session. Nothing external needs undoing.
    pub async fn abandon(&self, id: Uuid, owner: &UserIdentity) -> Result<(), WizardError> {
        self.handle(id, owner).await?;
        self.sessions.write().await.remove(&id);
        info!(session_id = %id, "Wizard session abandoned");
        Ok(())
    }

    /// Send the completed selections to the backend.
    ///
    /// The backend call and its bookkeeping run on their own task, so the
    /// in-flight flag is lowered and the outcome recorded even if the caller
    /// goes away mid-call. The session lock is not held across the call. A
    /// successful submission ends the session.
    pub async fn submit(&self, id: Uuid, owner: &UserIdentity) -> Result<Confirmation, WizardError> {
        let handle = self.handle(id, owner).await?;
        let request = handle.lock().await.begin_submission()?;

        let backend = Arc::clone(&self.backend);
        let sessions = Arc::clone(&self.sessions);
        let identity = owner.clone();
        let task_handle = Arc::clone(&handle);
        let task = tokio::spawn(async move {
            let result = backend.submit(&request, &identity).await;
            let outcome = task_handle.lock().await.finish_submission(&request, result);
            if let Ok(ref confirmation) = outcome {
                sessions.write().await.remove(&id);
                info!(session_id = %id, domain = %confirmation.domain_name, "Website submitted, session closed");
            }
            outcome
        });

        match task.await {
            Ok(outcome) => Ok(outcome?),
            Err(e) => {
                // The backend call panicked; treat it as a failed submission.
                warn!(session_id = %id, error = %e, "Submission task aborted");
                let failure = BackendError::RequestFailed {
                    reason: e.to_string(),
                };
                let mut session = handle.lock().await;
                if session.is_submitting() {
                    session.abort_submission(&failure);
                }
                Err(SubmissionError::Backend(failure).into())
            }
        }
    }

    /// Open a payment order for the session's chosen plan.
    pub async fn create_payment_order(
        &self,
        id: Uuid,
        owner: &UserIdentity,
    ) -> Result<PaymentOrder, WizardError> {
        let handle = self.handle(id, owner).await?;
        let plan = handle
            .lock()
            .await
            .selections()
            .plan
            .ok_or(WizardError::PlanNotSelected)?;
        let amount = self.pricing.price(plan);
        let currency = self.pricing.currency.clone();

        let result = self.payments.create_order(plan, amount, &currency).await;
        if let Err(ref e) = result {
            warn!(session_id = %id, error = %e, "Payment order creation failed");
            handle.lock().await.notifications_mut().error(PAYMENT_FAILED_MESSAGE);
        }

        Ok(PaymentOrder {
            id: result?,
            plan,
            amount,
            currency,
        })
    }

    /// Check an order after the buyer acted on it and tell the user how it went.
    pub async fn confirm_payment_order(
        &self,
        id: Uuid,
        owner: &UserIdentity,
        order_id: &str,
    ) -> Result<OrderStatus, WizardError> {
        let handle = self.handle(id, owner).await?;
        let result = self.payments.confirm_order(order_id).await;
        handle.lock().await.record_payment_outcome(&result);
        Ok(result?)
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many went.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(max_idle) {
            Ok(d) => Utc::now() - d,
            Err(_) => return 0,
        };

        let mut sessions = self.sessions.write().await;
        let mut stale = Vec::new();
        for (id, handle) in sessions.iter() {
            // A locked session is in use, so not idle.
            if let Ok(session) = handle.try_lock() {
                if session.last_active() < cutoff && !session.is_submitting() {
                    stale.push(*id);
                }
            }
        }
        for id in &stale {
            sessions.remove(id);
            debug!(session_id = %id, "Idle wizard session pruned");
        }
        if !stale.is_empty() {
            info!(count = stale.len(), "Pruned idle wizard sessions");
        }
        stale.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Spawn a background task that periodically prunes idle sessions.
pub fn spawn_prune_task(
    manager: Arc<WizardManager>,
    interval: Duration,
    max_idle: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            manager.prune_idle(max_idle).await;
        }
    })
}
