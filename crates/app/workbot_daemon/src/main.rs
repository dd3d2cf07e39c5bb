//! Work-session chat bot daemon.
//!
//! Reads chat events as newline-delimited JSON on stdin and replies in the
//! configured channel. Logs go to stderr.

pub use self::error::{Error, Result};
mod error;

mod config;
mod inbound;
mod logging;

use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};
use workbot_core::backend::{WorkTracker, WorkTrackerClient};
use workbot_core::config::BotConfig;
use workbot_core::credential::{Credential, CredentialManager};
use workbot_core::dispatcher::ChatDispatcher;
use workbot_core::helix::{HelixClient, TwitchIdentity};
use workbot_core::outbound::{AuthHeaders, ChatTransport, OutboundSender};

use config::Args;

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!("{}", e);
            eprintln!("workbot: {e}");
            1
        }
    };
    // A blocking stdin read cannot be cancelled; exit without waiting on it.
    std::process::exit(code);
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Args::parse().into_config()?;
    logging::init()?;

    info!(
        version = workbot_core::version(),
        channel = %config.channel_login,
        work_tracker_url = %config.work_tracker_url,
        "starting workbot"
    );

    let credentials = Arc::new(CredentialManager::new(
        Arc::new(TwitchIdentity::new(
            &config.id_api_url,
            config.client_id.as_str(),
            config.client_secret.as_str(),
            config.request_timeout,
        )?),
        Credential::new(config.access_token.as_str(), config.refresh_token.clone()),
    ));

    let freshness = credentials.ensure_fresh(config.startup_min_remaining).await?;
    info!(?freshness, "startup credential check passed");

    let helix = Arc::new(HelixClient::new(&config.helix_api_url, config.request_timeout)?);
    let (bot_id, broadcaster_id) = resolve_identities(&config, &credentials, &helix).await?;

    let backend: Arc<dyn WorkTracker> = Arc::new(WorkTrackerClient::new(
        &config.work_tracker_url,
        config.work_tracker_token.clone(),
        config.request_timeout,
    )?);
    let sender = Arc::new(OutboundSender::new(
        Arc::clone(&helix) as Arc<dyn ChatTransport>,
        Arc::clone(&credentials),
        config.client_id.as_str(),
        broadcaster_id,
        bot_id,
    ));
    let dispatcher = Arc::new(ChatDispatcher::new(backend, sender));

    let cancel = CancellationToken::new();
    let freshness_task = credentials.spawn_freshness_task(
        config.refresh_interval,
        config.refresh_threshold,
        cancel.clone(),
    );

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("interrupt received, shutting down"),
                Err(e) => warn!(error = %e, "cannot listen for interrupt"),
            }
            cancel.cancel();
        }
    });

    let tracker = TaskTracker::new();
    let stdin = BufReader::new(tokio::io::stdin());
    let pumped = inbound::pump(stdin, dispatcher, &tracker, &cancel).await;

    // Stop the freshness loop and let in-flight replies and refreshes finish.
    cancel.cancel();
    tracker.close();
    tracker.wait().await;
    if let Err(e) = freshness_task.await {
        warn!(error = %e, "freshness task ended abnormally");
    }

    let dispatched = pumped?;
    info!(dispatched, "workbot stopped");
    Ok(())
}

/// Resolve the bot's own user id and the channel's broadcaster id.
async fn resolve_identities(
    config: &BotConfig,
    credentials: &CredentialManager,
    helix: &HelixClient,
) -> Result<(String, String)> {
    let validation = credentials.validate().await?;
    let bot_id = validation.user_id.ok_or(Error::MissingBotUserId)?;

    let auth = AuthHeaders {
        client_id: config.client_id.clone(),
        access_token: credentials.current_access_token(),
    };
    let broadcaster = helix
        .user_by_login(&auth, &config.channel_login)
        .await?
        .ok_or_else(|| Error::UnknownChannel(config.channel_login.clone()))?;

    info!(
        bot_login = ?validation.login,
        bot_id = %bot_id,
        broadcaster_id = %broadcaster.id,
        "resolved chat identities"
    );
    Ok((bot_id, broadcaster.id))
}
