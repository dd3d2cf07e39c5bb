use std::num::IntErrorKind;

use tracing::info;

use super::CommandError;
use super::reply::{self, NO_ACTIVE_SESSION, mention};
use crate::backend::{CommandOutcome, WorkTracker};

pub const MIN_EXTEND_MINUTES: u32 = 1;
pub const MAX_EXTEND_MINUTES: u32 = 360;

const MISSING_MINUTES: &str = "延長時間（分）を指定してください。例: !more 30";
const NOT_A_NUMBER: &str = "延長時間は数値で指定してください。例: !more 30";
const OUT_OF_RANGE: &str = "延長時間は1〜360分の範囲で指定してください。";

/// Zero code points of the non-ASCII decimal digit blocks accepted in minutes.
const DIGIT_ZEROS: [u32; 4] = [0x0660, 0x06F0, 0x0966, 0xFF10];

/// Exactly one integer token in `MIN_EXTEND_MINUTES..=MAX_EXTEND_MINUTES`.
pub(super) fn parse(args: &str) -> Result<u32, CommandError> {
    let mut tokens = args.split_whitespace();
    let token = tokens
        .next()
        .ok_or_else(|| CommandError::InvalidArgument(MISSING_MINUTES.to_string()))?;
    if tokens.next().is_some() {
        return Err(CommandError::InvalidArgument(NOT_A_NUMBER.to_string()));
    }

    let normalized = normalize_integer(token)
        .ok_or_else(|| CommandError::InvalidArgument(NOT_A_NUMBER.to_string()))?;
    let minutes = match normalized.parse::<i64>() {
        Ok(minutes) => minutes,
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            return Err(CommandError::InvalidArgument(OUT_OF_RANGE.to_string()));
        }
        Err(_) => return Err(CommandError::InvalidArgument(NOT_A_NUMBER.to_string())),
    };
    if !(i64::from(MIN_EXTEND_MINUTES)..=i64::from(MAX_EXTEND_MINUTES)).contains(&minutes) {
        return Err(CommandError::InvalidArgument(OUT_OF_RANGE.to_string()));
    }
    Ok(minutes as u32)
}

fn decimal_value(c: char) -> Option<u32> {
    c.to_digit(10).or_else(|| {
        let code = u32::from(c);
        DIGIT_ZEROS
            .iter()
            .find_map(|&zero| (zero..zero + 10).contains(&code).then(|| code - zero))
    })
}

/// ASCII form of an integer token.
///
/// Accepts an optional `+`/`-` sign, decimal digits from the full-width and
/// other supported digit blocks, and single underscores between digits.
fn normalize_integer(token: &str) -> Option<String> {
    let (negative, body) = match token.chars().next()? {
        '-' => (true, &token[1..]),
        '+' => (false, &token[1..]),
        _ => (false, token),
    };

    let mut ascii = String::with_capacity(body.len() + 1);
    if negative {
        ascii.push('-');
    }
    let mut after_digit = false;
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            let digit_follows = chars.peek().is_some_and(|&next| decimal_value(next).is_some());
            if !after_digit || !digit_follows {
                return None;
            }
            after_digit = false;
            continue;
        }
        ascii.push(char::from_digit(decimal_value(c)?, 10)?);
        after_digit = true;
    }
    after_digit.then_some(ascii)
}

pub(super) async fn run(backend: &dyn WorkTracker, user: &str, minutes: u32) -> String {
    match backend.extend(user, minutes).await {
        Ok(CommandOutcome::Success(resp)) => {
            info!(user, session_id = resp.session_id, minutes = resp.minutes, "session extended");
            mention(user, &format!("作業時間を{}分延長しました！", resp.minutes))
        }
        Ok(CommandOutcome::NotFound(_)) => mention(user, NO_ACTIVE_SESSION),
        Ok(CommandOutcome::InvalidArgument(_)) => mention(user, OUT_OF_RANGE),
        Ok(outcome) => reply::fallback(user, "more", &outcome),
        Err(e) => reply::backend_failure(user, "more", &e),
    }
}
