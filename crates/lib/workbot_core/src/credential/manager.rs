//! Credential manager.
//!
//! Validates the stored credential, refreshes it proactively from a periodic
//! task, and reactively when a consumer observes an authentication failure.
//! At most one network refresh is in flight at any time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::store::{CredentialState, CredentialStore};
use super::{Credential, CredentialError, IdentityProvider, TokenValidation};

/// Result of a completed freshness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// The credential had at least the requested lifetime left.
    Fresh { expires_in: u64 },
    /// A refresh was performed (or collapsed into a concurrent one).
    Refreshed,
}

/// Bookkeeping guarded by the refresh lock.
struct RefreshSlot {
    /// Outcome of the most recent network refresh.
    last_outcome: Option<Result<(), CredentialError>>,
}

/// Owns the chat credential and serializes refreshes.
pub struct CredentialManager {
    store: CredentialStore,
    provider: Arc<dyn IdentityProvider>,
    refresh_lock: Mutex<RefreshSlot>,
    /// Number of network refresh attempts. Only written under `refresh_lock`.
    generation: AtomicU64,
}

impl CredentialManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, credential: Credential) -> Self {
        Self {
            store: CredentialStore::new(credential),
            provider,
            refresh_lock: Mutex::new(RefreshSlot { last_outcome: None }),
            generation: AtomicU64::new(0),
        }
    }

    /// Latest access token. Never waits on an in-flight refresh.
    pub fn current_access_token(&self) -> String {
        self.store.access_token()
    }

    pub fn state(&self) -> CredentialState {
        self.store.state()
    }

    /// Lifetime in seconds reported by the last refresh, if any.
    pub fn expires_in(&self) -> Option<u64> {
        self.store.expires_in()
    }

    /// Check the current access token with the identity provider.
    ///
    /// Does not touch the store.
    pub async fn validate(&self) -> Result<TokenValidation, CredentialError> {
        let token = self.store.access_token();
        self.provider.validate(&token).await
    }

    /// Refresh the credential, collapsing concurrent callers into one network call.
    ///
    /// Callers that queue behind a refresh which completes while they wait
    /// return that refresh's outcome without touching the network. The caller
    /// that takes the lock first re-validates the current token and returns
    /// early when it is already good.
    pub async fn refresh(&self) -> Result<(), CredentialError> {
        self.refresh_unless_lasting(Duration::ZERO).await
    }

    /// Refresh unless the current token validates with at least `min_remaining` left.
    async fn refresh_unless_lasting(&self, min_remaining: Duration) -> Result<(), CredentialError> {
        let seen = self.generation.load(Ordering::Acquire);
        let mut slot = self.refresh_lock.lock().await;

        if self.generation.load(Ordering::Acquire) != seen {
            debug!("credential refreshed while waiting for the lock");
            return slot.last_outcome.clone().unwrap_or(Ok(()));
        }

        self.store.set_state(CredentialState::Refreshing);

        match self.validate().await {
            Ok(validation) if validation.expires_in >= min_remaining.as_secs().max(1) => {
                debug!(
                    expires_in = validation.expires_in,
                    "current token still valid, skipping refresh"
                );
                self.store.set_state(CredentialState::Valid);
                return Ok(());
            }
            Ok(validation) => debug!(
                expires_in = validation.expires_in,
                "current token expires soon, refreshing"
            ),
            Err(e) => debug!(error = %e, "current token failed validation, refreshing"),
        }

        let outcome = self.refresh_over_network().await;
        match &outcome {
            Ok(()) => info!(expires_in = ?self.store.expires_in(), "access token refreshed"),
            Err(e) => {
                self.generation.fetch_add(1, Ordering::Release);
                self.store.set_state(CredentialState::RefreshFailed);
                error!(error = %e, "access token refresh failed");
            }
        }

        slot.last_outcome = Some(outcome.clone());
        outcome
    }

    async fn refresh_over_network(&self) -> Result<(), CredentialError> {
        let refresh_token = self
            .store
            .refresh_token()
            .ok_or(CredentialError::RefreshUnavailable)?;
        let refreshed = self.provider.refresh(&refresh_token).await?;
        if !refreshed.scope.is_empty() {
            debug!(scopes = ?refreshed.scope, "refresh granted scopes");
        }
        // Bumped before the token is published: whoever reads the new token
        // also reads the new generation and re-validates instead of inheriting.
        self.generation.fetch_add(1, Ordering::Release);
        self.store.apply(refreshed);
        Ok(())
    }

    #[cfg(test)]
    pub(super) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Refresh when the token has less than `min_remaining` left or fails validation.
    pub async fn ensure_fresh(&self, min_remaining: Duration) -> Result<Freshness, CredentialError> {
        match self.validate().await {
            Ok(validation) if validation.expires_in >= min_remaining.as_secs() => {
                debug!(expires_in = validation.expires_in, "access token is fresh");
                Ok(Freshness::Fresh {
                    expires_in: validation.expires_in,
                })
            }
            Ok(validation) => {
                info!(
                    expires_in = validation.expires_in,
                    "access token expires soon, refreshing"
                );
                self.refresh_unless_lasting(min_remaining).await?;
                Ok(Freshness::Refreshed)
            }
            Err(e) => {
                warn!(error = %e, "access token failed validation, refreshing");
                self.refresh().await?;
                Ok(Freshness::Refreshed)
            }
        }
    }

    /// Spawn the periodic freshness check.
    ///
    /// The first check runs one `period` after spawning. Cancelling `cancel`
    /// stops the loop between checks; a check already running completes first.
    pub fn spawn_freshness_task(
        self: &Arc<Self>,
        period: Duration,
        min_remaining: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }
                if let Err(e) = manager.ensure_fresh(min_remaining).await {
                    if e.is_fatal() {
                        error!(error = %e, "credential cannot be refreshed until rotated");
                    } else {
                        warn!(error = %e, "periodic freshness check failed");
                    }
                }
            }
            debug!("freshness loop stopped");
        })
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("store", &self.store)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
