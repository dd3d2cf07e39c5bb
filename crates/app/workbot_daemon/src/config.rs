//! Command-line and environment configuration.

use std::time::Duration;

use clap::Parser;
use workbot_core::config::{
    BotConfig, DEFAULT_HELIX_API_URL, DEFAULT_ID_API_URL, DEFAULT_WORK_TRACKER_URL,
};

use crate::{Error, Result};

/// CLI arguments. Every flag can also be set from the environment or `.env`.
#[derive(Parser)]
#[command(
    name = "workbot",
    version,
    about = "Chat bot that records work sessions from chat commands"
)]
pub struct Args {
    /// Application client id.
    #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
    pub client_id: String,

    /// Application client secret, used for the refresh grant.
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Initial user access token.
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    /// Refresh token. Without one, an expired access token cannot be renewed.
    #[arg(long, env = "REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Login of the channel to serve. A leading `@` is ignored.
    #[arg(long = "channel", env = "CHANNELS")]
    pub channel: String,

    /// Base URL of the work-tracking backend.
    #[arg(long, env = "WORK_TRACKER_URL", default_value = DEFAULT_WORK_TRACKER_URL)]
    pub work_tracker_url: String,

    /// Bearer token for the work-tracking backend.
    #[arg(long, env = "WORK_TRACKER_TOKEN", hide_env_values = true)]
    pub work_tracker_token: Option<String>,

    #[arg(long, env = "HELIX_API_URL", default_value = DEFAULT_HELIX_API_URL)]
    pub helix_api_url: String,

    #[arg(long, env = "ID_API_URL", default_value = DEFAULT_ID_API_URL)]
    pub id_api_url: String,

    /// Seconds between proactive freshness checks.
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value_t = 60)]
    pub refresh_interval_secs: u64,

    /// Refresh when fewer seconds than this remain.
    #[arg(long, env = "REFRESH_THRESHOLD_SECS", default_value_t = 300)]
    pub refresh_threshold_secs: u64,

    /// Startup refresh threshold in seconds.
    #[arg(long, env = "STARTUP_MIN_REMAINING_SECS", default_value_t = 180)]
    pub startup_min_remaining_secs: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,
}

impl Args {
    pub fn into_config(self) -> Result<BotConfig> {
        if self.refresh_interval_secs == 0 {
            return Err(Error::Custom(
                "REFRESH_INTERVAL_SECS must be greater than zero".into(),
            ));
        }

        let mut config = BotConfig::new(
            self.client_id,
            self.client_secret,
            self.access_token,
            self.refresh_token,
            &self.channel,
        );
        if config.channel_login.is_empty() {
            return Err(Error::Custom("CHANNELS must name a channel".into()));
        }

        config.work_tracker_url = self.work_tracker_url;
        config.work_tracker_token = self.work_tracker_token.filter(|t| !t.trim().is_empty());
        config.helix_api_url = self.helix_api_url;
        config.id_api_url = self.id_api_url;
        config.refresh_interval = Duration::from_secs(self.refresh_interval_secs);
        config.refresh_threshold = Duration::from_secs(self.refresh_threshold_secs);
        config.startup_min_remaining = Duration::from_secs(self.startup_min_remaining_secs);
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(config)
    }
}
