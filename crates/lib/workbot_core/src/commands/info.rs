use super::reply::{self, NOT_JOINED, mention};
use crate::backend::{CommandOutcome, WorkTracker};

pub(super) async fn run(backend: &dyn WorkTracker, user: &str) -> String {
    match backend.info(user).await {
        Ok(CommandOutcome::Success(info)) => format!(
            "@{user}さん→退出まで:{}分/今日の累計作業時間:{}分/累計作業時間:{}分",
            info.remaining_minutes, info.today_total_minutes, info.lifetime_total_minutes
        ),
        Ok(CommandOutcome::NotFound(_)) => mention(user, NOT_JOINED),
        Ok(outcome) => reply::fallback(user, "info", &outcome),
        Err(e) => reply::backend_failure(user, "info", &e),
    }
}
