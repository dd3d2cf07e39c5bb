//! Chat credential lifecycle.
//!
//! The access/refresh token pair lives in a single [`store::CredentialStore`]
//! owned by the [`manager::CredentialManager`]. Nothing outside this module can
//! mutate it; consumers read the current access token and ask the manager to
//! refresh when the chat platform rejects it.
//!
//! The identity provider (token validation and the refresh grant) is reached
//! through the [`IdentityProvider`] trait so the lock discipline can be
//! exercised without a network.

pub mod manager;
pub mod store;

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use manager::{CredentialManager, Freshness};
pub use store::{CredentialState, CredentialStore};

/// Credential lifecycle errors.
///
/// `Clone` so that callers queued behind an in-flight refresh can observe the
/// same failure the refreshing caller saw.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// The identity provider rejected the access token.
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    /// No refresh token was configured, so the credential cannot be renewed.
    #[error("Refresh unavailable: no refresh token configured")]
    RefreshUnavailable,

    /// The identity provider rejected the refresh token.
    #[error("Refresh rejected: HTTP {status}: {body}")]
    RefreshRejected { status: u16, body: String },

    /// Network failure or timeout talking to the identity provider.
    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    /// The identity provider answered with a body we could not parse.
    #[error("Identity provider response parse error: {0}")]
    Decode(String),
}

impl CredentialError {
    /// Whether the credential stays unusable until rotated externally.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CredentialError::RefreshUnavailable | CredentialError::RefreshRejected { .. }
        )
    }
}

/// Access/refresh token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime in seconds reported by the last refresh. Advisory only.
    pub expires_in: Option<u64>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_in: None,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Successful token validation.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenValidation {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Remaining lifetime in seconds.
    pub expires_in: u64,
}

/// Tokens returned by the refresh grant.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// Absent when the provider does not rotate refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Vec<String>,
}

impl fmt::Debug for RefreshedTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshedTokens")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Identity provider operations used by the credential manager.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check an access token. Fails with `AuthFailure` when it is invalid or expired.
    async fn validate(&self, access_token: &str) -> Result<TokenValidation, CredentialError>;

    /// Exchange a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, CredentialError>;
}
