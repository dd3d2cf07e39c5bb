use tracing::info;

use super::reply::{self, NOT_JOINED, mention};
use crate::backend::{CommandOutcome, WorkTracker};

/// The trimmed remainder. Empty is a valid value and clears the work name.
pub(super) fn parse(args: &str) -> String {
    args.trim().to_string()
}

pub(super) async fn run(backend: &dyn WorkTracker, user: &str, work_name: &str) -> String {
    match backend.change(user, work_name).await {
        Ok(CommandOutcome::Success(resp)) => {
            info!(user, session_id = resp.session_id, work_name = %resp.work_name, "work name changed");
            let work = if resp.work_name.is_empty() {
                "作業".to_string()
            } else {
                format!("\"{}\"", resp.work_name)
            };
            mention(user, &format!("{work}を開始しました"))
        }
        Ok(CommandOutcome::NotFound(_)) => mention(user, NOT_JOINED),
        Ok(outcome) => reply::fallback(user, "change", &outcome),
        Err(e) => reply::backend_failure(user, "change", &e),
    }
}
