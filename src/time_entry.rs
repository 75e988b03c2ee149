use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Toggl APIのtime entry。
///
/// 差分検出では`id`を同一性の判定に使い、値の比較には
/// `start`, `stop`, `duration`, `description`, `tags`だけを使う。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: i64,
    #[serde(default, alias = "wid")]
    pub workspace_id: Option<i64>,
    #[serde(default, alias = "pid")]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub billable: bool,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub stop: Option<DateTime<Utc>>,
    /// 秒単位。実行中のtime entryは負の値になる。
    pub duration: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

impl TimeEntry {
    /// 外部から観測できる値が同じかどうかを返す。
    ///
    /// tagsは順序も含めて比較するため、並び替えただけでも異なるものとして扱う。
    pub fn is_similar(&self, other: &TimeEntry) -> bool {
        self.start == other.start
            && self.stop == other.stop
            && self.duration == other.duration
            && self.description == other.description
            && self.tags == other.tags
    }
}

/// time entryの作成・更新時に送るパラメータ。
///
/// 指定しなかった項目は送信しない。
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimeEntryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_with: Option<String>,
}

/// bulk tag updateでtagを追加するか削除するか。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    Add,
    Remove,
}

/// ある時点で取得できた全time entry。idの昇順で列挙される。
pub type Snapshot = BTreeMap<i64, TimeEntry>;

/// 取得したtime entryからsnapshotを作る。
///
/// 同じidが複数ある場合は後に取得したものを優先する。
pub fn snapshot_from_entries(entries: Vec<TimeEntry>) -> Snapshot {
    entries.into_iter().map(|entry| (entry.id, entry)).collect()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub mod fixtures {
    use chrono::{TimeZone, Utc};

    use super::TimeEntry;

    /// テスト用のtime entryを作成する。
    pub fn entry(id: i64, start_hour: u32, description: &str) -> TimeEntry {
        TimeEntry {
            id,
            workspace_id: Some(1),
            project_id: None,
            billable: false,
            start: Utc.with_ymd_and_hms(2024, 1, 1, start_hour, 0, 0).unwrap(),
            stop: Some(Utc.with_ymd_and_hms(2024, 1, 1, start_hour + 1, 0, 0).unwrap()),
            duration: 3600,
            description: Some(description.to_string()),
            tags: vec![],
            at: None,
        }
    }
}
