//! Outbound chat replies.
//!
//! [`OutboundSender`] posts a reply with the current chat access token. A 401
//! from the chat transport triggers one reactive refresh through the
//! [`CredentialManager`] and exactly one resend; a second 401 is returned to
//! the caller.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::credential::{CredentialError, CredentialManager};

/// Errors from posting a reply.
#[derive(Debug, Error)]
pub enum SendError {
    /// The transport still answered 401 after a refresh and resend.
    #[error("Chat transport rejected the credential after refresh")]
    Unauthorized,

    #[error("Chat send rejected: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Chat transport unreachable: {0}")]
    Transport(String),

    /// The reactive refresh itself failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Authentication header pair for the chat API.
#[derive(Clone)]
pub struct AuthHeaders {
    pub client_id: String,
    pub access_token: String,
}

impl std::fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeaders")
            .field("client_id", &self.client_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Body of a chat send request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub broadcaster_id: String,
    pub sender_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parent_message_id: Option<String>,
}

/// Raw status and body returned by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Chat platform send operation.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Post one message. Only network failures are errors; every HTTP status
    /// is returned as a [`TransportResponse`].
    async fn send_message(
        &self,
        auth: &AuthHeaders,
        message: &ChatMessage,
    ) -> Result<TransportResponse, SendError>;
}

/// Why the platform accepted a message but did not deliver it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DropReason {
    pub code: String,
    pub message: String,
}

/// Delivery report for a posted reply.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SentMessage {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default = "default_is_sent")]
    pub is_sent: bool,
    #[serde(default)]
    pub drop_reason: Option<DropReason>,
}

fn default_is_sent() -> bool {
    true
}

#[derive(Deserialize)]
struct SendMessageResponse {
    data: Vec<SentMessage>,
}

impl SentMessage {
    fn from_body(body: &str) -> Self {
        match serde_json::from_str::<SendMessageResponse>(body) {
            Ok(resp) => resp.data.into_iter().next().unwrap_or_else(Self::unreported),
            Err(e) => {
                debug!(error = %e, "unrecognized send response body");
                Self::unreported()
            }
        }
    }

    fn unreported() -> Self {
        Self {
            message_id: None,
            is_sent: true,
            drop_reason: None,
        }
    }
}

/// Posts replies into one conversation as one sender.
pub struct OutboundSender {
    transport: Arc<dyn ChatTransport>,
    credentials: Arc<CredentialManager>,
    client_id: String,
    broadcaster_id: String,
    sender_id: String,
}

impl OutboundSender {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        credentials: Arc<CredentialManager>,
        client_id: impl Into<String>,
        broadcaster_id: impl Into<String>,
        sender_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            credentials,
            client_id: client_id.into(),
            broadcaster_id: broadcaster_id.into(),
            sender_id: sender_id.into(),
        }
    }

    fn auth_headers(&self) -> AuthHeaders {
        AuthHeaders {
            client_id: self.client_id.clone(),
            access_token: self.credentials.current_access_token(),
        }
    }

    /// Post `text`, optionally as a reply to `reply_to`.
    pub async fn send_reply(
        &self,
        text: &str,
        reply_to: Option<&str>,
    ) -> Result<SentMessage, SendError> {
        let message = ChatMessage {
            broadcaster_id: self.broadcaster_id.clone(),
            sender_id: self.sender_id.clone(),
            message: text.to_string(),
            reply_parent_message_id: reply_to.map(str::to_string),
        };

        let mut response = self
            .transport
            .send_message(&self.auth_headers(), &message)
            .await?;

        if response.status == 401 {
            warn!("chat send returned 401, refreshing credential");
            self.credentials.refresh().await?;
            response = self
                .transport
                .send_message(&self.auth_headers(), &message)
                .await?;
            if response.status == 401 {
                return Err(SendError::Unauthorized);
            }
        }

        if !(200..300).contains(&response.status) {
            return Err(SendError::Rejected {
                status: response.status,
                body: response.body,
            });
        }

        let sent = SentMessage::from_body(&response.body);
        if !sent.is_sent {
            warn!(
                drop_reason = ?sent.drop_reason,
                "chat platform accepted the reply but dropped it"
            );
        }
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::credential::{Credential, IdentityProvider, RefreshedTokens, TokenValidation};

    /// Transport that replays scripted statuses and records the tokens it saw.
    struct ScriptedTransport {
        statuses: Mutex<VecDeque<u16>>,
        seen_tokens: Mutex<Vec<String>>,
        seen_messages: Mutex<Vec<ChatMessage>>,
    }

    impl ScriptedTransport {
        fn new(statuses: &[u16]) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.iter().copied().collect()),
                seen_tokens: Mutex::new(Vec::new()),
                seen_messages: Mutex::new(Vec::new()),
            })
        }

        fn attempts(&self) -> usize {
            self.seen_tokens.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send_message(
            &self,
            auth: &AuthHeaders,
            message: &ChatMessage,
        ) -> Result<TransportResponse, SendError> {
            self.seen_tokens.lock().unwrap().push(auth.access_token.clone());
            self.seen_messages.lock().unwrap().push(message.clone());
            let status = self.statuses.lock().unwrap().pop_front().unwrap_or(200);
            let body = if status == 200 {
                r#"{"data":[{"message_id":"m-1","is_sent":true,"drop_reason":null}]}"#.to_string()
            } else {
                r#"{"error":"Unauthorized","status":401,"message":"Invalid OAuth token"}"#
                    .to_string()
            };
            Ok(TransportResponse { status, body })
        }
    }

    /// Provider that rejects every access token and mints numbered ones.
    struct RotatingProvider {
        refresh_calls: AtomicU32,
    }

    #[async_trait]
    impl IdentityProvider for RotatingProvider {
        async fn validate(&self, _access_token: &str) -> Result<TokenValidation, CredentialError> {
            Err(CredentialError::AuthFailure("invalid access token".into()))
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedTokens, CredentialError> {
            let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(RefreshedTokens {
                access_token: format!("access-{n}"),
                refresh_token: None,
                expires_in: Some(14_400),
                scope: vec![],
            })
        }
    }

    fn sender(
        transport: Arc<ScriptedTransport>,
        refresh_token: Option<&str>,
    ) -> (OutboundSender, Arc<RotatingProvider>) {
        let provider = Arc::new(RotatingProvider {
            refresh_calls: AtomicU32::new(0),
        });
        let credentials = Arc::new(CredentialManager::new(
            Arc::clone(&provider) as Arc<dyn IdentityProvider>,
            Credential::new("initial", refresh_token.map(Into::into)),
        ));
        let sender = OutboundSender::new(transport, credentials, "cid", "b-1", "bot-1");
        (sender, provider)
    }

    #[tokio::test]
    async fn success_sends_once_with_current_token() {
        let transport = ScriptedTransport::new(&[200]);
        let (sender, provider) = sender(Arc::clone(&transport), Some("r"));

        let sent = sender.send_reply("hello", Some("parent-1")).await.unwrap();

        assert_eq!(sent.message_id.as_deref(), Some("m-1"));
        assert_eq!(transport.attempts(), 1);
        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 0);
        let messages = transport.seen_messages.lock().unwrap();
        assert_eq!(
            messages[0],
            ChatMessage {
                broadcaster_id: "b-1".into(),
                sender_id: "bot-1".into(),
                message: "hello".into(),
                reply_parent_message_id: Some("parent-1".into()),
            }
        );
    }

    #[tokio::test]
    async fn single_401_refreshes_once_and_resends_with_new_token() {
        let transport = ScriptedTransport::new(&[401, 200]);
        let (sender, provider) = sender(Arc::clone(&transport), Some("r"));

        sender.send_reply("hello", None).await.unwrap();

        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *transport.seen_tokens.lock().unwrap(),
            vec!["initial".to_string(), "access-1".to_string()]
        );
    }

    #[tokio::test]
    async fn second_401_is_surfaced_without_a_third_attempt() {
        let transport = ScriptedTransport::new(&[401, 401, 200]);
        let (sender, provider) = sender(Arc::clone(&transport), Some("r"));

        let err = sender.send_reply("hello", None).await.unwrap_err();

        assert!(matches!(err, SendError::Unauthorized));
        assert_eq!(transport.attempts(), 2);
        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_failure_is_surfaced_without_resend() {
        let transport = ScriptedTransport::new(&[401, 200]);
        let (sender, _provider) = sender(Arc::clone(&transport), None);

        let err = sender.send_reply("hello", None).await.unwrap_err();

        assert!(matches!(
            err,
            SendError::Credential(CredentialError::RefreshUnavailable)
        ));
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn other_error_statuses_are_rejections() {
        let transport = ScriptedTransport::new(&[403]);
        let (sender, provider) = sender(Arc::clone(&transport), Some("r"));

        let err = sender.send_reply("hello", None).await.unwrap_err();

        assert!(matches!(err, SendError::Rejected { status: 403, .. }));
        assert_eq!(transport.attempts(), 1);
        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sent_message_reports_drop_reason() {
        let sent = SentMessage::from_body(
            r#"{"data":[{"message_id":"","is_sent":false,"drop_reason":{"code":"msg_duplicate","message":"duplicate"}}]}"#,
        );
        assert!(!sent.is_sent);
        assert_eq!(sent.drop_reason.unwrap().code, "msg_duplicate");
    }

    #[test]
    fn unrecognized_send_body_counts_as_sent() {
        let sent = SentMessage::from_body("");
        assert!(sent.is_sent);
        assert!(sent.message_id.is_none());
    }

    #[test]
    fn chat_message_omits_absent_reply_parent() {
        let message = ChatMessage {
            broadcaster_id: "b".into(),
            sender_id: "s".into(),
            message: "m".into(),
            reply_parent_message_id: None,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("reply_parent_message_id").is_none());
    }
}
