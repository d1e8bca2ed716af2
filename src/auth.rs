//! Identity provider integration: who is signed in, and profile edits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::account::ProfileUpdate;
use crate::error::AuthError;

/// The signed-in user, as vouched for by the identity provider.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    /// Provider-assigned user id.
    pub uid: String,
    pub email: Option<String>,
    /// Bearer token forwarded to downstream services on the user's behalf.
    pub id_token: SecretString,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>, id_token: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            id_token: SecretString::from(id_token.into()),
        }
    }
}

/// Minimal capability surface of the hosted identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to a user. `Ok(None)` means no user is signed in.
    async fn verify(&self, token: &str) -> Result<Option<UserIdentity>, AuthError>;

    /// Push validated profile changes to the provider.
    async fn update_profile(
        &self,
        identity: &UserIdentity,
        update: &ProfileUpdate,
    ) -> Result<(), AuthError>;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    uid: String,
    #[serde(default)]
    email: Option<String>,
}

/// [`IdentityProvider`] backed by the provider's REST API.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::RequestFailed {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify(&self, token: &str) -> Result<Option<UserIdentity>, AuthError> {
        let resp = self
            .client
            .get(self.url("verify"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::debug!(status = %status, "Bearer token rejected by identity provider");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let verified: VerifyResponse = resp
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        Ok(Some(UserIdentity {
            uid: verified.uid,
            email: verified.email,
            id_token: SecretString::from(token.to_string()),
        }))
    }

    async fn update_profile(
        &self,
        identity: &UserIdentity,
        update: &ProfileUpdate,
    ) -> Result<(), AuthError> {
        let body = serde_json::json!({
            "uid": identity.uid,
            "display_name": update.display_name(),
            "email": update.email,
            "phone_number": update.phone_number,
        });

        let resp = self
            .client
            .post(self.url("profile"))
            .bearer_auth(identity.id_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::RequestFailed {
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, body });
        }

        tracing::info!(uid = %identity.uid, "Profile updated");
        Ok(())
    }
}

/// Pull the token out of an `Authorization: Bearer ...` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
