//! HTTP implementation of [`WorkTracker`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{
    ChangeCommandRequest, ChangeCommandResponse, ErrorResponse, ExtendCommandRequest,
    ExtendCommandResponse, JoinCommandRequest, JoinCommandResponse, OutCommandRequest,
    OutCommandResponse, UserInfoResponse,
};
use super::status::{self, StatusMap};
use super::{BackendError, CommandOutcome, WorkTracker};

/// Stateless client for the work-tracking REST API.
#[derive(Clone)]
pub struct WorkTrackerClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl WorkTrackerClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8000`).
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: parsed,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        map: &StatusMap,
    ) -> Result<CommandOutcome<T>, BackendError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let resp = request.send().await.map_err(|e| {
            BackendError::Transport(format!("{} request failed: {e}", map.command()))
        })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            BackendError::Transport(format!("{} response read failed: {e}", map.command()))
        })?;

        if status.is_success() {
            let parsed = serde_json::from_str(&body)
                .map_err(|e| BackendError::Decode(format!("{} response: {e}", map.command())))?;
            return Ok(CommandOutcome::Success(parsed));
        }

        let reason = error_reason(status, &body);
        debug!(
            command = map.command(),
            status = status.as_u16(),
            reason = %reason,
            "backend rejected command"
        );
        Ok(map.classify(status.as_u16(), reason))
    }
}

/// Reason text from an error body, falling back to the raw body or status text.
fn error_reason(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        return parsed.error;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        trimmed.to_string()
    }
}

impl std::fmt::Debug for WorkTrackerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkTrackerClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WorkTracker for WorkTrackerClient {
    async fn join(
        &self,
        user_name: &str,
        work_name: Option<&str>,
    ) -> Result<CommandOutcome<JoinCommandResponse>, BackendError> {
        let url = self.endpoint(&["api", "commands", "join"]);
        debug!(%url, user = user_name, work_name = ?work_name, "POST join");
        let body = JoinCommandRequest {
            user_name,
            work_name,
        };
        self.send(self.http.post(url).json(&body), &status::JOIN).await
    }

    async fn out(&self, user_name: &str) -> Result<CommandOutcome<OutCommandResponse>, BackendError> {
        let url = self.endpoint(&["api", "commands", "out"]);
        debug!(%url, user = user_name, "POST out");
        let body = OutCommandRequest { user_name };
        self.send(self.http.post(url).json(&body), &status::OUT).await
    }

    async fn extend(
        &self,
        user_name: &str,
        minutes: u32,
    ) -> Result<CommandOutcome<ExtendCommandResponse>, BackendError> {
        let url = self.endpoint(&["api", "commands", "more"]);
        debug!(%url, user = user_name, minutes, "POST more");
        let body = ExtendCommandRequest { user_name, minutes };
        self.send(self.http.post(url).json(&body), &status::EXTEND).await
    }

    async fn change(
        &self,
        user_name: &str,
        work_name: &str,
    ) -> Result<CommandOutcome<ChangeCommandResponse>, BackendError> {
        let url = self.endpoint(&["api", "commands", "change"]);
        debug!(%url, user = user_name, work_name, "POST change");
        let body = ChangeCommandRequest {
            user_name,
            work_name,
        };
        self.send(self.http.post(url).json(&body), &status::CHANGE).await
    }

    async fn info(&self, user_name: &str) -> Result<CommandOutcome<UserInfoResponse>, BackendError> {
        let url = self.endpoint(&["api", "users", user_name, "info"]);
        debug!(%url, user = user_name, "GET info");
        self.send(self.http.get(url), &status::INFO).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client(server: &MockServer) -> WorkTrackerClient {
        WorkTrackerClient::new(&server.base_url(), None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn new_rejects_unparseable_url() {
        let err = WorkTrackerClient::new("not a url", None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BackendError::InvalidUrl(_)));
    }

    #[test]
    fn endpoint_encodes_user_names() {
        let client =
            WorkTrackerClient::new("http://backend:8000/", None, Duration::from_secs(1)).unwrap();
        let url = client.endpoint(&["api", "users", "山田 太郎/x", "info"]);
        assert_eq!(
            url.as_str(),
            "http://backend:8000/api/users/%E5%B1%B1%E7%94%B0%20%E5%A4%AA%E9%83%8E%2Fx/info"
        );
    }

    #[test]
    fn debug_redacts_backend_token() {
        let client = WorkTrackerClient::new(
            "http://backend:8000",
            Some("b4ckend-token".into()),
            Duration::from_secs(1),
        )
        .unwrap();

        let printed = format!("{client:?}");

        assert!(!printed.contains("b4ckend-token"), "{printed}");
        assert!(printed.contains("http://backend:8000/"), "{printed}");
    }

    #[test]
    fn error_reason_prefers_error_field() {
        assert_eq!(
            error_reason(StatusCode::CONFLICT, r#"{"error":"already in session"}"#),
            "already in session"
        );
        assert_eq!(error_reason(StatusCode::BAD_GATEWAY, " upstream down \n"), "upstream down");
        assert_eq!(error_reason(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[tokio::test]
    async fn join_posts_work_name_and_parses_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/commands/join")
                    .json_body(json!({"user_name": "alice", "work_name": "資料作成"}));
                then.status(200).json_body(json!({
                    "session_id": 7,
                    "user_id": 3,
                    "work_name": "資料作成",
                    "start_time": "2025-01-01T10:00:00Z",
                    "planned_end": "2025-01-01T12:00:00Z"
                }));
            })
            .await;

        let outcome = client(&server).join("alice", Some("資料作成")).await.unwrap();

        mock.assert_async().await;
        match outcome {
            CommandOutcome::Success(resp) => {
                assert_eq!(resp.session_id, 7);
                assert_eq!(resp.work_name.as_deref(), Some("資料作成"));
                assert!(resp.planned_end.is_some());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn join_omits_absent_work_name() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/commands/join")
                    .json_body(json!({"user_name": "alice"}));
                then.status(200)
                    .json_body(json!({"session_id": 1, "user_id": 1}));
            })
            .await;

        let outcome = client(&server).join("alice", None).await.unwrap();

        mock.assert_async().await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn join_conflict_is_classified() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/commands/join");
                then.status(409).json_body(json!({"error": "already in session"}));
            })
            .await;

        let outcome = client(&server).join("alice", None).await.unwrap();

        assert_eq!(outcome, CommandOutcome::Conflict("already in session".into()));
    }

    #[tokio::test]
    async fn extend_not_found_is_classified() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/commands/more")
                    .json_body(json!({"user_name": "bob", "minutes": 30}));
                then.status(404).json_body(json!({"error": "no active session"}));
            })
            .await;

        let outcome = client(&server).extend("bob", 30).await.unwrap();

        mock.assert_async().await;
        assert_eq!(outcome, CommandOutcome::NotFound("no active session".into()));
    }

    #[tokio::test]
    async fn change_sends_empty_work_name() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/commands/change")
                    .json_body(json!({"user_name": "carol", "work_name": ""}));
                then.status(200)
                    .json_body(json!({"session_id": 2, "user_id": 5, "work_name": ""}));
            })
            .await;

        let outcome = client(&server).change("carol", "").await.unwrap();

        mock.assert_async().await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn info_gets_user_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/users/dave/info");
                then.status(200).json_body(json!({
                    "user_id": 9,
                    "remaining_minutes": 45,
                    "today_total_minutes": 120,
                    "lifetime_total_minutes": 3000
                }));
            })
            .await;

        let outcome = client(&server).info("dave").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            outcome,
            CommandOutcome::Success(UserInfoResponse {
                user_id: 9,
                remaining_minutes: 45,
                today_total_minutes: 120,
                lifetime_total_minutes: 3000,
            })
        );
    }

    #[tokio::test]
    async fn server_error_is_unknown_with_raw_reason() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/commands/out");
                then.status(500).body("Failed to complete: db down");
            })
            .await;

        let outcome = client(&server).out("erin").await.unwrap();

        assert_eq!(
            outcome,
            CommandOutcome::UnknownError {
                status: 500,
                reason: "Failed to complete: db down".into()
            }
        );
    }

    #[tokio::test]
    async fn backend_token_is_sent_as_bearer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/commands/out")
                    .header("authorization", "Bearer backend-secret");
                then.status(200)
                    .json_body(json!({"session_id": 1, "user_id": 1}));
            })
            .await;

        let client = WorkTrackerClient::new(
            &server.base_url(),
            Some("backend-secret".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        let outcome = client.out("frank").await.unwrap();

        mock.assert_async().await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/users/gina/info");
                then.status(200).body("not json");
            })
            .await;

        let err = client(&server).info("gina").await.unwrap_err();

        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let client =
            WorkTrackerClient::new("http://127.0.0.1:9", None, Duration::from_millis(500)).unwrap();
        let err = client.out("hank").await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
