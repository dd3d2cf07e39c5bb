//! Backend request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct JoinCommandRequest<'a> {
    pub user_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OutCommandRequest<'a> {
    pub user_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExtendCommandRequest<'a> {
    pub user_name: &'a str,
    pub minutes: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangeCommandRequest<'a> {
    pub user_name: &'a str,
    pub work_name: &'a str,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct JoinCommandResponse {
    pub session_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub work_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub planned_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OutCommandResponse {
    pub session_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub actual_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExtendCommandResponse {
    pub session_id: i64,
    pub user_id: i64,
    pub minutes: u32,
    #[serde(default)]
    pub planned_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ChangeCommandResponse {
    pub session_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub work_name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UserInfoResponse {
    pub user_id: i64,
    pub remaining_minutes: i64,
    pub today_total_minutes: i64,
    pub lifetime_total_minutes: i64,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}
