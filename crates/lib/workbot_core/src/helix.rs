//! Twitch HTTP clients.
//!
//! [`HelixClient`] implements [`ChatTransport`] against the Helix REST API and
//! resolves user ids by login. [`TwitchIdentity`] implements
//! [`IdentityProvider`] against the OAuth validate and token endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::credential::{CredentialError, IdentityProvider, RefreshedTokens, TokenValidation};
use crate::outbound::{AuthHeaders, ChatMessage, ChatTransport, SendError, TransportResponse};

/// Errors from Helix lookups.
#[derive(Debug, Error)]
pub enum HelixError {
    #[error("Helix request failed: {0}")]
    Transport(String),

    #[error("Helix HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Helix response parse error: {0}")]
    Decode(String),
}

/// A Helix user.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HelixUser {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Deserialize)]
struct UsersResponse {
    data: Vec<HelixUser>,
}

fn build_http(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Helix REST client.
#[derive(Clone, Debug)]
pub struct HelixClient {
    http: reqwest::Client,
    api_url: String,
}

impl HelixClient {
    /// `api_url` is the Helix root, e.g. `https://api.twitch.tv/helix`.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, HelixError> {
        let http = build_http(timeout)
            .map_err(|e| HelixError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up a user by login. `Ok(None)` when no such user exists.
    pub async fn user_by_login(
        &self,
        auth: &AuthHeaders,
        login: &str,
    ) -> Result<Option<HelixUser>, HelixError> {
        let resp = self
            .http
            .get(format!("{}/users", self.api_url))
            .query(&[("login", login)])
            .bearer_auth(&auth.access_token)
            .header("Client-Id", &auth.client_id)
            .send()
            .await
            .map_err(|e| HelixError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| HelixError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(HelixError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let users: UsersResponse =
            serde_json::from_str(&body).map_err(|e| HelixError::Decode(e.to_string()))?;
        Ok(users.data.into_iter().next())
    }
}

#[async_trait]
impl ChatTransport for HelixClient {
    async fn send_message(
        &self,
        auth: &AuthHeaders,
        message: &ChatMessage,
    ) -> Result<TransportResponse, SendError> {
        let resp = self
            .http
            .post(format!("{}/chat/messages", self.api_url))
            .bearer_auth(&auth.access_token)
            .header("Client-Id", &auth.client_id)
            .json(message)
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;
        debug!(status, "chat message posted");
        Ok(TransportResponse { status, body })
    }
}

/// Twitch OAuth endpoints.
#[derive(Clone)]
pub struct TwitchIdentity {
    http: reqwest::Client,
    id_api_url: String,
    client_id: String,
    client_secret: String,
}

impl TwitchIdentity {
    /// `id_api_url` is the OAuth root, e.g. `https://id.twitch.tv/oauth2`.
    pub fn new(
        id_api_url: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CredentialError> {
        let http = build_http(timeout)
            .map_err(|e| CredentialError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            id_api_url: id_api_url.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }
}

impl std::fmt::Debug for TwitchIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitchIdentity")
            .field("id_api_url", &self.id_api_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for TwitchIdentity {
    async fn validate(&self, access_token: &str) -> Result<TokenValidation, CredentialError> {
        let resp = self
            .http
            .get(format!("{}/validate", self.id_api_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| CredentialError::Transport(format!("token validation failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CredentialError::Transport(format!("token validation failed: {e}")))?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(CredentialError::AuthFailure(body));
        }
        if !status.is_success() {
            return Err(CredentialError::Transport(format!(
                "token validation HTTP {status}: {body}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| CredentialError::Decode(format!("validate response: {e}")))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, CredentialError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let resp = self
            .http
            .post(format!("{}/token", self.id_api_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| CredentialError::Transport(format!("token refresh failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CredentialError::Transport(format!("token refresh failed: {e}")))?;

        if status.is_client_error() {
            return Err(CredentialError::RefreshRejected {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            return Err(CredentialError::Transport(format!(
                "token refresh HTTP {status}: {body}"
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| CredentialError::Decode(format!("token response: {e}")))
    }
}
