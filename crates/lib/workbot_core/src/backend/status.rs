//! Per-command HTTP status tables.
//!
//! Status codes mean different things per command (409 is only "already in a
//! session" for join, 400 is "invalid extension length" for extend), so every
//! command carries its own table. Unlisted non-2xx statuses become
//! [`CommandOutcome::UnknownError`].

use super::CommandOutcome;

/// How a listed non-2xx status is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Conflict,
    NotFound,
    InvalidArgument,
}

/// Status → rejection lookup table for one command.
#[derive(Debug)]
pub struct StatusMap {
    command: &'static str,
    entries: &'static [(u16, Rejection)],
}

impl StatusMap {
    pub const fn new(command: &'static str, entries: &'static [(u16, Rejection)]) -> Self {
        Self { command, entries }
    }

    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn rejection(&self, status: u16) -> Option<Rejection> {
        self.entries
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, rejection)| *rejection)
    }

    /// Classify a non-2xx status.
    pub fn classify<T>(&self, status: u16, reason: String) -> CommandOutcome<T> {
        match self.rejection(status) {
            Some(Rejection::Conflict) => CommandOutcome::Conflict(reason),
            Some(Rejection::NotFound) => CommandOutcome::NotFound(reason),
            Some(Rejection::InvalidArgument) => CommandOutcome::InvalidArgument(reason),
            None => CommandOutcome::UnknownError { status, reason },
        }
    }
}

pub const JOIN: StatusMap = StatusMap::new(
    "join",
    &[(400, Rejection::InvalidArgument), (409, Rejection::Conflict)],
);

pub const OUT: StatusMap = StatusMap::new(
    "out",
    &[(400, Rejection::InvalidArgument), (404, Rejection::NotFound)],
);

pub const EXTEND: StatusMap = StatusMap::new(
    "more",
    &[(400, Rejection::InvalidArgument), (404, Rejection::NotFound)],
);

pub const CHANGE: StatusMap = StatusMap::new(
    "change",
    &[(400, Rejection::InvalidArgument), (404, Rejection::NotFound)],
);

pub const INFO: StatusMap = StatusMap::new("info", &[(404, Rejection::NotFound)]);
