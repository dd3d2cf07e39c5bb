use tracing::info;

use super::reply::{self, NO_ACTIVE_SESSION, mention};
use crate::backend::{CommandOutcome, WorkTracker};

pub(super) async fn run(backend: &dyn WorkTracker, user: &str) -> String {
    match backend.out(user).await {
        Ok(CommandOutcome::Success(resp)) => {
            info!(user, session_id = resp.session_id, "session completed");
            mention(user, "作業を終了しました。お疲れ様でした！")
        }
        Ok(CommandOutcome::NotFound(_)) => mention(user, NO_ACTIVE_SESSION),
        Ok(outcome) => reply::fallback(user, "out", &outcome),
        Err(e) => reply::backend_failure(user, "out", &e),
    }
}
