//! Website backend: accepts new-website submissions and lists a user's
//! websites.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::auth::UserIdentity;
use crate::error::BackendError;
use crate::wizard::model::{CompleteSelections, Plan};

/// Create-request for a new website. The owner's id token travels as a
/// bearer header, not in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub owner_uid: String,
    #[serde(flatten)]
    pub selections: CompleteSelections,
}

/// What the backend hands back for an accepted submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteStatus {
    /// Live and serving traffic.
    Active,
    /// Submitted and being built.
    Development,
}

impl std::fmt::Display for WebsiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Development => write!(f, "development"),
        }
    }
}

/// A website owned by the user, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
    pub id: String,
    pub domain_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    pub status: WebsiteStatus,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic interface to the website service.
#[async_trait]
pub trait SiteBackend: Send + Sync {
    /// Create a website from completed wizard selections.
    async fn submit(
        &self,
        request: &SubmissionRequest,
        identity: &UserIdentity,
    ) -> Result<SubmissionReceipt, BackendError>;

    /// List the user's websites in the given state.
    async fn list_websites(
        &self,
        identity: &UserIdentity,
        status: WebsiteStatus,
    ) -> Result<Vec<Website>, BackendError>;
}

/// [`SiteBackend`] over the backend's JSON REST API.
pub struct HttpSiteBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSiteBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::RequestFailed {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                timeout: self.timeout,
            }
        } else {
            BackendError::RequestFailed {
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl SiteBackend for HttpSiteBackend {
    async fn submit(
        &self,
        request: &SubmissionRequest,
        identity: &UserIdentity,
    ) -> Result<SubmissionReceipt, BackendError> {
        let resp = self
            .client
            .post(self.url("websites"))
            .bearer_auth(identity.id_token.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;
        if !status.is_success() {
            tracing::warn!(status = %status, "Backend rejected website submission");
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // The backend may answer with an empty body; that is still a success.
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }

    async fn list_websites(
        &self,
        identity: &UserIdentity,
        status: WebsiteStatus,
    ) -> Result<Vec<Website>, BackendError> {
        let resp = self
            .client
            .get(self.url("websites"))
            .query(&[("status", status.to_string())])
            .bearer_auth(identity.id_token.expose_secret())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !resp.status().is_success() {
            let code = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Rejected { status: code, body });
        }

        resp.json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::model::{ContentSource, WebsiteType};

    #[test]
    fn submission_request_is_flat_json() {
        let request = SubmissionRequest {
            owner_uid: "user-1".to_string(),
            selections: CompleteSelections {
                theme: "modern".to_string(),
                website_type: WebsiteType::Business,
                description: "Coffee shop".to_string(),
                content_source: ContentSource::Generated,
                domain_name: "example.com".to_string(),
                plan: Plan::Premium,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["owner_uid"], "user-1");
        assert_eq!(json["theme"], "modern");
        assert_eq!(json["website_type"], "business");
        assert_eq!(json["content_source"], "generated");
        assert_eq!(json["domain_name"], "example.com");
        assert_eq!(json["plan"], "premium");
        assert!(json.get("selections").is_none());
    }

    #[test]
    fn receipt_tolerates_missing_id() {
        let receipt: SubmissionReceipt = serde_json::from_str("{}").unwrap();
        assert!(receipt.website_id.is_none());
    }

    #[test]
    fn website_serde() {
        let json = r#"{
            "id": "w1",
            "domain_name": "example.com",
            "status": "development",
            "created_at": "2026-01-02T03:04:05Z"
        }"#;
        let site: Website = serde_json::from_str(json).unwrap();
        assert_eq!(site.status, WebsiteStatus::Development);
        assert!(site.plan.is_none());
    }
}
