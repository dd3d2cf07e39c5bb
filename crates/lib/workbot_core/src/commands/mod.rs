//! Chat command handlers.
//!
//! Each handler parses the text after its keyword into a [`CommandRequest`],
//! makes at most one backend call, and maps the outcome to exactly one reply.
//! Parse failures are reported before any network call.

mod change;
mod extend;
mod info;
mod join;
mod out;
pub mod reply;

use thiserror::Error;

use crate::backend::WorkTracker;

pub use extend::{MAX_EXTEND_MINUTES, MIN_EXTEND_MINUTES};

/// Recognized chat commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Join,
    Out,
    Extend,
    Change,
    Info,
    Ping,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        CommandKind::Join,
        CommandKind::Out,
        CommandKind::Extend,
        CommandKind::Change,
        CommandKind::Info,
        CommandKind::Ping,
    ];

    /// Chat keyword, matched case-sensitively.
    pub fn keyword(self) -> &'static str {
        match self {
            CommandKind::Join => "!in",
            CommandKind::Out => "!out",
            CommandKind::Extend => "!more",
            CommandKind::Change => "!change",
            CommandKind::Info => "!info",
            CommandKind::Ping => "!ping",
        }
    }
}

/// A parsed command. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRequest {
    Join { user: String, work_name: Option<String> },
    Out { user: String },
    Extend { user: String, minutes: u32 },
    /// An empty `work_name` clears the session's work name.
    Change { user: String, work_name: String },
    Info { user: String },
    Ping,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Malformed arguments. The message is user-facing.
    #[error("{0}")]
    InvalidArgument(String),
}

impl CommandRequest {
    /// Parse `args`, the text following the keyword of `kind`.
    pub fn parse(kind: CommandKind, user: &str, args: &str) -> Result<Self, CommandError> {
        let user = user.to_string();
        Ok(match kind {
            CommandKind::Join => CommandRequest::Join {
                user,
                work_name: join::parse(args),
            },
            CommandKind::Out => CommandRequest::Out { user },
            CommandKind::Extend => CommandRequest::Extend {
                user,
                minutes: extend::parse(args)?,
            },
            CommandKind::Change => CommandRequest::Change {
                user,
                work_name: change::parse(args),
            },
            CommandKind::Info => CommandRequest::Info { user },
            CommandKind::Ping => CommandRequest::Ping,
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            CommandRequest::Join { .. } => CommandKind::Join,
            CommandRequest::Out { .. } => CommandKind::Out,
            CommandRequest::Extend { .. } => CommandKind::Extend,
            CommandRequest::Change { .. } => CommandKind::Change,
            CommandRequest::Info { .. } => CommandKind::Info,
            CommandRequest::Ping => CommandKind::Ping,
        }
    }
}

/// Run a parsed command against the backend and build its reply.
pub async fn execute(backend: &dyn WorkTracker, request: &CommandRequest) -> String {
    match request {
        CommandRequest::Join { user, work_name } => {
            join::run(backend, user, work_name.as_deref()).await
        }
        CommandRequest::Out { user } => out::run(backend, user).await,
        CommandRequest::Extend { user, minutes } => extend::run(backend, user, *minutes).await,
        CommandRequest::Change { user, work_name } => change::run(backend, user, work_name).await,
        CommandRequest::Info { user } => info::run(backend, user).await,
        CommandRequest::Ping => "pong".to_string(),
    }
}

/// Parse and run one command, returning the reply for `user`.
pub async fn handle(backend: &dyn WorkTracker, kind: CommandKind, user: &str, args: &str) -> String {
    match CommandRequest::parse(kind, user, args) {
        Ok(request) => execute(backend, &request).await,
        Err(CommandError::InvalidArgument(message)) => {
            tracing::info!(user, command = kind.keyword(), reason = %message, "rejected command arguments");
            reply::mention(user, &message)
        }
    }
}
