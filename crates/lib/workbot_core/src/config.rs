//! Bootstrap configuration.

use std::time::Duration;

/// Default base URL of the work-tracking backend.
pub const DEFAULT_WORK_TRACKER_URL: &str = "http://localhost:8000";
/// Default base URL of the chat platform's REST API.
pub const DEFAULT_HELIX_API_URL: &str = "https://api.twitch.tv/helix";
/// Default base URL of the identity provider.
pub const DEFAULT_ID_API_URL: &str = "https://id.twitch.tv/oauth2";

/// Static configuration resolved once at process start.
#[derive(Clone)]
pub struct BotConfig {
    /// Application client id sent with every chat API call.
    pub client_id: String,
    /// Application client secret used for the refresh grant.
    pub client_secret: String,
    /// Initial access token.
    pub access_token: String,
    /// Initial refresh token. Without one, refresh fails with `RefreshUnavailable`.
    pub refresh_token: Option<String>,
    /// Login of the channel the bot listens and replies in.
    pub channel_login: String,
    /// Base URL of the work-tracking backend (e.g. "http://localhost:8000").
    pub work_tracker_url: String,
    /// Bearer token for the work-tracking backend. Independent of the chat credential.
    pub work_tracker_token: Option<String>,
    /// Base URL of the chat REST API.
    pub helix_api_url: String,
    /// Base URL of the identity provider.
    pub id_api_url: String,
    /// Period of the proactive freshness check.
    pub refresh_interval: Duration,
    /// Remaining lifetime below which the periodic check refreshes.
    pub refresh_threshold: Duration,
    /// Remaining lifetime below which the startup check refreshes.
    pub startup_min_remaining: Duration,
    /// Timeout applied to every outbound HTTP request.
    pub request_timeout: Duration,
}

impl BotConfig {
    /// Config with defaults for everything but the credentials and channel.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        channel: &str,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            access_token: access_token.into(),
            refresh_token: refresh_token.filter(|t| !t.trim().is_empty()),
            channel_login: normalize_channel(channel),
            work_tracker_url: DEFAULT_WORK_TRACKER_URL.to_string(),
            work_tracker_token: None,
            helix_api_url: DEFAULT_HELIX_API_URL.to_string(),
            id_api_url: DEFAULT_ID_API_URL.to_string(),
            refresh_interval: Duration::from_secs(60),
            refresh_threshold: Duration::from_secs(300),
            startup_min_remaining: Duration::from_secs(180),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("channel_login", &self.channel_login)
            .field("work_tracker_url", &self.work_tracker_url)
            .field(
                "work_tracker_token",
                &self.work_tracker_token.as_ref().map(|_| "<redacted>"),
            )
            .field("helix_api_url", &self.helix_api_url)
            .field("id_api_url", &self.id_api_url)
            .field("refresh_interval", &self.refresh_interval)
            .field("refresh_threshold", &self.refresh_threshold)
            .field("startup_min_remaining", &self.startup_min_remaining)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Strip surrounding whitespace and a leading `@` from a channel login.
pub fn normalize_channel(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_string()
}
