//! Inbound chat dispatch.
//!
//! [`ChatDispatcher::handle`] is the single callback the event transport
//! invokes per chat message. It recognizes at most one command, runs its
//! handler, and posts exactly one reply. Unrecognized text is ignored.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::backend::WorkTracker;
use crate::commands::{self, CommandKind};
use crate::outbound::{OutboundSender, SendError, SentMessage};

/// One parsed inbound chat message.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChatEvent {
    /// Login of the chatter.
    pub sender: String,
    pub text: String,
    /// Platform message id, used to thread the reply.
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Result of handling one event.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Not a command. No reply was attempted.
    Ignored,
    Replied(SentMessage),
    ReplyFailed(SendError),
}

/// Match `text` against the command keywords.
///
/// The bare keyword must match exactly; with arguments, the keyword must be
/// followed by whitespace. Returns the kind and the text after the keyword.
pub fn recognize(text: &str) -> Option<(CommandKind, &str)> {
    let text = text.trim();
    CommandKind::ALL.into_iter().find_map(|kind| {
        let rest = text.strip_prefix(kind.keyword())?;
        (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some((kind, rest))
    })
}

pub struct ChatDispatcher {
    backend: Arc<dyn WorkTracker>,
    sender: Arc<OutboundSender>,
}

impl ChatDispatcher {
    pub fn new(backend: Arc<dyn WorkTracker>, sender: Arc<OutboundSender>) -> Self {
        Self { backend, sender }
    }

    /// Handle one event. Failures are logged and returned, never raised.
    pub async fn handle(&self, event: &ChatEvent) -> DispatchOutcome {
        let Some((kind, args)) = recognize(&event.text) else {
            debug!(sender = %event.sender, "ignoring non-command message");
            return DispatchOutcome::Ignored;
        };

        info!(sender = %event.sender, command = kind.keyword(), "dispatching command");
        let reply = commands::handle(self.backend.as_ref(), kind, &event.sender, args).await;

        match self
            .sender
            .send_reply(&reply, event.message_id.as_deref())
            .await
        {
            Ok(sent) => DispatchOutcome::Replied(sent),
            Err(SendError::Credential(e)) if e.is_fatal() => {
                error!(
                    command = kind.keyword(),
                    error = %e,
                    "chat credential cannot be refreshed; replies will fail until it is rotated"
                );
                DispatchOutcome::ReplyFailed(SendError::Credential(e))
            }
            Err(e) => {
                warn!(command = kind.keyword(), error = %e, "failed to send reply");
                DispatchOutcome::ReplyFailed(e)
            }
        }
    }
}
