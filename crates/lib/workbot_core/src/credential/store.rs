//! Credential store.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Credential, RefreshedTokens};

/// Lifecycle state of the stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Valid,
    Refreshing,
    /// The last refresh failed. Cleared by the next successful refresh.
    RefreshFailed,
}

struct Slot {
    credential: Credential,
    state: CredentialState,
}

/// Holds the current credential.
///
/// Reads never wait on network I/O: the lock is only held for the duration of
/// a clone or an assignment. Writers are restricted to the credential module.
pub struct CredentialStore {
    slot: RwLock<Slot>,
}

impl CredentialStore {
    pub fn new(credential: Credential) -> Self {
        Self {
            slot: RwLock::new(Slot {
                credential,
                state: CredentialState::Valid,
            }),
        }
    }

    pub fn access_token(&self) -> String {
        self.read().credential.access_token.clone()
    }

    pub fn has_refresh_token(&self) -> bool {
        self.read().credential.refresh_token.is_some()
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.read().credential.expires_in
    }

    pub fn state(&self) -> CredentialState {
        self.read().state
    }

    pub(super) fn refresh_token(&self) -> Option<String> {
        self.read().credential.refresh_token.clone()
    }

    pub(super) fn set_state(&self, state: CredentialState) {
        self.write().state = state;
    }

    /// Replace the token pair in one write. Keeps the old refresh token when
    /// the provider did not rotate it.
    pub(super) fn apply(&self, refreshed: RefreshedTokens) {
        let mut slot = self.write();
        slot.credential.access_token = refreshed.access_token;
        if let Some(refresh_token) = refreshed.refresh_token {
            slot.credential.refresh_token = Some(refresh_token);
        }
        slot.credential.expires_in = refreshed.expires_in;
        slot.state = CredentialState::Valid;
    }

    fn read(&self) -> RwLockReadGuard<'_, Slot> {
        // A panic while holding the guard cannot leave a half-written
        // credential: every write is a plain field assignment.
        self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slot> {
        self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.read();
        f.debug_struct("CredentialStore")
            .field("credential", &slot.credential)
            .field("state", &slot.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refreshed(access: &str, refresh: Option<&str>) -> RefreshedTokens {
        RefreshedTokens {
            access_token: access.into(),
            refresh_token: refresh.map(Into::into),
            expires_in: Some(14_400),
            scope: vec![],
        }
    }

    #[test]
    fn apply_replaces_both_tokens() {
        let store = CredentialStore::new(Credential::new("old", Some("r1".into())));
        store.apply(refreshed("new", Some("r2")));
        assert_eq!(store.access_token(), "new");
        assert_eq!(store.refresh_token().as_deref(), Some("r2"));
        assert_eq!(store.expires_in(), Some(14_400));
    }

    #[test]
    fn apply_keeps_refresh_token_when_not_rotated() {
        let store = CredentialStore::new(Credential::new("old", Some("r1".into())));
        store.apply(refreshed("new", None));
        assert_eq!(store.refresh_token().as_deref(), Some("r1"));
    }

    #[test]
    fn apply_marks_state_valid() {
        let store = CredentialStore::new(Credential::new("old", Some("r1".into())));
        store.set_state(CredentialState::RefreshFailed);
        store.apply(refreshed("new", None));
        assert_eq!(store.state(), CredentialState::Valid);
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let store = CredentialStore::new(Credential::new("secret-access", Some("secret-refresh".into())));
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }
}
