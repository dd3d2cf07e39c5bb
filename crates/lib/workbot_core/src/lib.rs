//! # workbot_core
//!
//! Credential lifecycle and command dispatch core for the work-session chat bot.
//!
//! Inbound chat events flow through [`dispatcher::ChatDispatcher`], which
//! recognizes a command, runs the matching handler in [`commands`] against the
//! [`backend`] client, and posts the reply via [`outbound::OutboundSender`].
//! The sender authenticates with the credential owned by
//! [`credential::CredentialManager`].

pub mod backend;
pub mod commands;
pub mod config;
pub mod credential;
pub mod dispatcher;
pub mod helix;
pub mod outbound;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
