use tracing::info;

use super::reply::{self, mention};
use crate::backend::{CommandOutcome, WorkTracker};

pub(super) fn parse(args: &str) -> Option<String> {
    let work_name = args.trim();
    (!work_name.is_empty()).then(|| work_name.to_string())
}

pub(super) async fn run(backend: &dyn WorkTracker, user: &str, work_name: Option<&str>) -> String {
    match backend.join(user, work_name).await {
        Ok(CommandOutcome::Success(resp)) => {
            info!(user, session_id = resp.session_id, user_id = resp.user_id, "session started");
            let work = resp
                .work_name
                .as_deref()
                .or(work_name)
                .filter(|w| !w.is_empty())
                .unwrap_or("作業");
            mention(user, &format!("{work}を開始しました！"))
        }
        Ok(CommandOutcome::Conflict(_)) => mention(
            user,
            "既に作業セッション中です。先に !out で終了してください。",
        ),
        Ok(outcome) => reply::fallback(user, "join", &outcome),
        Err(e) => reply::backend_failure(user, "join", &e),
    }
}
