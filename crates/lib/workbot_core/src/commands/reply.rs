//! Shared reply wording.

use tracing::{error, warn};

use crate::backend::{BackendError, CommandOutcome};

pub const GENERIC_FAILURE: &str = "コマンドの処理に失敗しました。";
pub const NO_ACTIVE_SESSION: &str = "有効な作業セッションがありません。";
pub const NOT_JOINED: &str = "入室していません";

/// Address a reply to `user`.
pub fn mention(user: &str, body: &str) -> String {
    format!("@{user} {body}")
}

/// Reply for an outcome the handler has no specific wording for.
pub(crate) fn fallback<T>(user: &str, command: &str, outcome: &CommandOutcome<T>) -> String {
    match outcome {
        CommandOutcome::InvalidArgument(reason) => {
            mention(user, &format!("入力が正しくありません: {reason}"))
        }
        CommandOutcome::UnknownError { status, reason } => {
            warn!(user, command, status, reason = %reason, "backend returned an unclassified error");
            mention(user, GENERIC_FAILURE)
        }
        other => {
            warn!(user, command, outcome = other.label(), "no reply wording for outcome");
            mention(user, GENERIC_FAILURE)
        }
    }
}

/// Reply when the backend could not be reached or answered garbage.
pub(crate) fn backend_failure(user: &str, command: &str, err: &BackendError) -> String {
    error!(user, command, error = %err, "backend call failed");
    mention(user, GENERIC_FAILURE)
}
