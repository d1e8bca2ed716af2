//! HTTP API: shared state, error mapping, authentication and the
//! account/dashboard endpoints. Wizard endpoints live in
//! [`crate::wizard::routes`].

use std::sync::Arc;

use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::account::{FieldError, ProfileUpdate};
use crate::auth::{HttpIdentityProvider, IdentityProvider, UserIdentity, bearer_token};
use crate::backend::{HttpSiteBackend, Website, WebsiteStatus};
use crate::config::AppConfig;
use crate::error::{AuthError, BackendError, SubmissionError, WizardError};
use crate::payment::HttpPaymentGateway;
use crate::wizard::WizardManager;
use crate::wizard::routes::wizard_routes;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub wizard: Arc<WizardManager>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(wizard: Arc<WizardManager>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { wizard, identity }
    }

    /// Wire the HTTP-backed collaborators described by `config`.
    pub fn from_config(config: &AppConfig) -> crate::error::Result<Self> {
        let backend = HttpSiteBackend::new(config.backend_url.clone(), config.request_timeout)?;
        let payments = HttpPaymentGateway::new(config.payment_url.clone(), config.request_timeout)?;
        let identity = HttpIdentityProvider::new(config.auth_url.clone(), config.request_timeout)?;

        let wizard = WizardManager::new(
            Arc::new(backend),
            Arc::new(payments),
            config.pricing.clone(),
        );
        Ok(Self::new(wizard, Arc::new(identity)))
    }
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Sign in to continue")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Invalid {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Invalid { fields, .. } => serde_json::json!({
                "error": self.to_string(),
                "fields": fields,
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<WizardError> for ApiError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::SessionNotFound { .. } => Self::NotFound(e.to_string()),
            WizardError::PlanNotSelected => Self::Conflict(e.to_string()),
            WizardError::Submission(SubmissionError::Backend(_)) => Self::Upstream(e.to_string()),
            WizardError::Submission(_) => Self::Conflict(e.to_string()),
            WizardError::Payment(_) => Self::Upstream(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        Self::Upstream(e.to_string())
    }
}

// ── Authentication ──────────────────────────────────────────────────────

/// Extractor for the signed-in user. Rejects with 401 when no user is present.
pub struct AuthUser(pub UserIdentity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(ApiError::Unauthorized)?;

        match state.identity.verify(token).await? {
            Some(identity) => Ok(AuthUser(identity)),
            None => Err(ApiError::Unauthorized),
        }
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sitecraft"
    }))
}

// ── Account ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ProfileUpdated {
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    message: &'static str,
}

/// PUT /api/account/profile
async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileUpdated>, ApiError> {
    update.validate().map_err(|fields| ApiError::Invalid {
        message: "Profile details are invalid".to_string(),
        fields,
    })?;

    state.identity.update_profile(&user, &update).await?;
    info!(uid = %user.uid, "Account details updated");

    Ok(Json(ProfileUpdated {
        display_name: update.display_name(),
        message: "Your details have been updated",
    }))
}

// ── Dashboard ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WebsitesQuery {
    #[serde(default)]
    status: Option<WebsiteStatus>,
}

#[derive(Debug, Serialize)]
struct WebsitesResponse {
    status: WebsiteStatus,
    websites: Vec<Website>,
    /// Shown when the list is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// GET /api/websites?status=active|development
async fn list_websites(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<WebsitesQuery>,
) -> Result<Json<WebsitesResponse>, ApiError> {
    let status = query.status.unwrap_or(WebsiteStatus::Active);
    let websites = state
        .wizard
        .backend()
        .list_websites(&user, status)
        .await
        .inspect_err(|e| warn!(uid = %user.uid, error = %e, "Failed to list websites"))?;

    let message = websites.is_empty().then_some(match status {
        WebsiteStatus::Active => "You have no active websites yet. Let's change that!",
        WebsiteStatus::Development => {
            "No website is currently being developed for you. Let's change that!"
        }
    });

    Ok(Json(WebsitesResponse {
        status,
        websites,
        message,
    }))
}

/// Build the full API router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/account/profile", put(update_profile))
        .route("/api/websites", get(list_websites))
        .merge(wizard_routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use super::*;
    use crate::backend::{SiteBackend, SubmissionReceipt, SubmissionRequest};
    use crate::config::PlanPricing;
    use crate::error::PaymentError;
    use crate::payment::{OrderStatus, PaymentGateway};
    use crate::wizard::model::Plan;

    struct StubIdentity;

    #[async_trait]
    impl IdentityProvider for StubIdentity {
        async fn verify(&self, token: &str) -> Result<Option<UserIdentity>, AuthError> {
            Ok((token == "good").then(|| UserIdentity::new("user-1", token)))
        }

        async fn update_profile(
            &self,
            _identity: &UserIdentity,
            _update: &ProfileUpdate,
        ) -> Result<(), AuthError> {
            Ok(())
        }
    }

    struct StubBackend;

    #[async_trait]
    impl SiteBackend for StubBackend {
        async fn submit(
            &self,
            _request: &SubmissionRequest,
            _identity: &UserIdentity,
        ) -> Result<SubmissionReceipt, BackendError> {
            Ok(SubmissionReceipt::default())
        }

        async fn list_websites(
            &self,
            _identity: &UserIdentity,
            status: WebsiteStatus,
        ) -> Result<Vec<Website>, BackendError> {
            Ok(match status {
                WebsiteStatus::Active => vec![Website {
                    id: "w1".into(),
                    domain_name: "example.com".into(),
                    theme: None,
                    plan: Some(Plan::Basic),
                    status,
                    created_at: Utc::now(),
                }],
                WebsiteStatus::Development => Vec::new(),
            })
        }
    }

    struct StubPayments;

    #[async_trait]
    impl PaymentGateway for StubPayments {
        async fn create_order(
            &self,
            _plan: Plan,
            _amount: Decimal,
            _currency: &str,
        ) -> Result<String, PaymentError> {
            Ok("order-1".into())
        }

        async fn confirm_order(&self, _order_id: &str) -> Result<OrderStatus, PaymentError> {
            Ok(OrderStatus::Approved)
        }
    }

    fn app() -> Router {
        let wizard = WizardManager::new(
            Arc::new(StubBackend),
            Arc::new(StubPayments),
            PlanPricing::default(),
        );
        app_routes(AppState::new(wizard, Arc::new(StubIdentity)))
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_needs_no_auth() {
        let resp = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_or_bad_token_is_unauthorized() {
        let resp = app()
            .oneshot(Request::get("/api/websites").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app()
            .oneshot(
                Request::get("/api/websites")
                    .header("authorization", "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "Sign in to continue");
    }

    #[tokio::test]
    async fn lists_websites_with_empty_message() {
        let resp = app()
            .oneshot(
                Request::get("/api/websites?status=development")
                    .header("authorization", "Bearer good")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(json["websites"].as_array().unwrap().is_empty());
        assert!(json["message"].as_str().unwrap().contains("being developed"));

        let resp = app()
            .oneshot(
                Request::get("/api/websites")
                    .header("authorization", "Bearer good")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["status"], "active");
        assert_eq!(json["websites"][0]["domain_name"], "example.com");
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn invalid_profile_is_unprocessable() {
        let resp = app()
            .oneshot(
                Request::put("/api/account/profile")
                    .header("authorization", "Bearer good")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email": "nope", "phone_number": "+254712345678"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert_eq!(json["fields"][0]["field"], "email");
    }

    #[tokio::test]
    async fn valid_profile_is_accepted() {
        let resp = app()
            .oneshot(
                Request::put("/api/account/profile")
                    .header("authorization", "Bearer good")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"first_name": "Ada", "last_name": "Lovelace"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["display_name"], "Ada Lovelace");
    }

    #[test]
    fn wizard_errors_map_to_status_codes() {
        let not_found: ApiError = WizardError::SessionNotFound {
            id: uuid::Uuid::nil(),
        }
        .into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let in_flight: ApiError = WizardError::from(SubmissionError::InFlight).into();
        assert_eq!(in_flight.status(), StatusCode::CONFLICT);

        let upstream: ApiError = WizardError::from(SubmissionError::Backend(
            BackendError::InvalidResponse("x".into()),
        ))
        .into();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }
}
