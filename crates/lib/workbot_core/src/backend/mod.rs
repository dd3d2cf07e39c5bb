//! Work-tracking backend client.
//!
//! One operation per chat command. Each call issues exactly one HTTP request
//! and classifies the response through that command's [`status::StatusMap`]
//! into a [`CommandOutcome`]. The client never retries and holds no mutable
//! state.
//!
//! The backend authenticates with its own optional bearer token. The chat
//! credential managed by [`crate::credential`] is never sent here, so a 401
//! from the backend is an ordinary `UnknownError` outcome and does not trigger
//! a chat credential refresh.

pub mod client;
pub mod models;
pub mod status;

use async_trait::async_trait;
use thiserror::Error;

pub use client::WorkTrackerClient;
pub use models::{
    ChangeCommandResponse, ExtendCommandResponse, JoinCommandResponse, OutCommandResponse,
    UserInfoResponse,
};
pub use status::{Rejection, StatusMap};

/// Transport-level backend errors. HTTP error statuses are outcomes, not errors.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Backend unreachable: {0}")]
    Transport(String),

    #[error("Backend response parse error: {0}")]
    Decode(String),
}

/// Classified result of one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome<T> {
    Success(T),
    /// Rejected because of existing state (e.g. already in a session).
    Conflict(String),
    /// Rejected because of missing state (e.g. no open session).
    NotFound(String),
    /// The backend refused the arguments.
    InvalidArgument(String),
    /// Any status the command's table does not name.
    UnknownError { status: u16, reason: String },
}

impl<T> CommandOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success(_))
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            CommandOutcome::Success(_) => "success",
            CommandOutcome::Conflict(_) => "conflict",
            CommandOutcome::NotFound(_) => "not_found",
            CommandOutcome::InvalidArgument(_) => "invalid_argument",
            CommandOutcome::UnknownError { .. } => "unknown_error",
        }
    }
}

/// Backend operations used by the command handlers.
#[async_trait]
pub trait WorkTracker: Send + Sync {
    /// Open a work session.
    async fn join(
        &self,
        user_name: &str,
        work_name: Option<&str>,
    ) -> Result<CommandOutcome<JoinCommandResponse>, BackendError>;

    /// Close the open work session.
    async fn out(&self, user_name: &str) -> Result<CommandOutcome<OutCommandResponse>, BackendError>;

    /// Extend the open work session by `minutes`.
    async fn extend(
        &self,
        user_name: &str,
        minutes: u32,
    ) -> Result<CommandOutcome<ExtendCommandResponse>, BackendError>;

    /// Rename the open work session. An empty name clears it.
    async fn change(
        &self,
        user_name: &str,
        work_name: &str,
    ) -> Result<CommandOutcome<ChangeCommandResponse>, BackendError>;

    /// Remaining and accumulated work time.
    async fn info(&self, user_name: &str) -> Result<CommandOutcome<UserInfoResponse>, BackendError>;
}
