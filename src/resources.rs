use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Toggl APIのユーザー情報。
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UserData {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub default_workspace_id: Option<i64>,
    /// 0(日曜)から6(土曜)。
    #[serde(default)]
    pub beginning_of_week: Option<u8>,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

/// ユーザー情報の更新パラメータ。
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UserParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_workspace_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beginning_of_week: Option<u8>,
}

/// Toggl APIのクライアント情報。
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ClientData {
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "wid")]
    pub workspace_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ClientParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Toggl APIのプロジェクト情報。
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProjectData {
    pub id: i64,
    pub name: String,
    #[serde(default, alias = "wid")]
    pub workspace_id: Option<i64>,
    #[serde(default, alias = "cid")]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub billable: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<i64>,
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProjectParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

/// クライアントのプロジェクトを取得する時の絞り込み条件。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectFilter {
    Active,
    Archived,
    Both,
}

impl ProjectFilter {
    pub fn as_query(&self) -> &'static str {
        match self {
            ProjectFilter::Active => "true",
            ProjectFilter::Archived => "false",
            ProjectFilter::Both => "both",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TaskData {
    pub id: i64,
    pub name: String,
    pub project_id: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub estimated_seconds: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProjectUserData {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub manager: bool,
    #[serde(default)]
    pub rate: Option<f64>,
}

/// bulk tag updateの結果。
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BulkUpdateResult {
    #[serde(default)]
    pub success: Vec<i64>,
    #[serde(default)]
    pub failure: Vec<BulkUpdateFailure>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BulkUpdateFailure {
    pub id: i64,
    pub message: String,
}
