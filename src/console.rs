use std::io::Write;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Local;

use crate::events::{EventHandler, TogglEvent};
use crate::time_entry::TimeEntry;

/// Consoleにtime entryを表示するためのtrait。
pub trait ConsolePresenter {
    /// タイムエントリーを開始時刻順に表示する。
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()>;

    /// 検出した変更を、イベント種別の見出しを付けて表示する。
    fn show_changes(&mut self, event: TogglEvent, time_entries: &[TimeEntry]) -> Result<()>;
}

/// タイムエントリーをMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    fn write_entry(&mut self, entry: &TimeEntry) -> Result<()> {
        writeln!(self.writer, "{}", format_entry(entry))
            .with_context(|| format!("Failed to write time entry: {:?}", entry))
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()> {
        let mut sorted_entries = time_entries.to_vec();
        sorted_entries.sort_by_key(|entry| entry.start);

        sorted_entries
            .iter()
            .try_for_each(|entry| self.write_entry(entry))
    }

    // 変更の順序はそのまま表示する
    fn show_changes(&mut self, event: TogglEvent, time_entries: &[TimeEntry]) -> Result<()> {
        writeln!(self.writer, "## {} ({})", event, time_entries.len())
            .context("Failed to write change header")?;

        time_entries
            .iter()
            .try_for_each(|entry| self.write_entry(entry))
    }
}

/// `- 10:00 ~ 11:00: description [tag1, tag2] (#id)`
fn format_entry(entry: &TimeEntry) -> String {
    let start_str = entry
        .start
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();
    let end_str = entry
        .stop
        .map(|stop| stop.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "now".to_string());
    let description = entry.description.as_deref().unwrap_or_default();
    let tags = if entry.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", entry.tags.join(", "))
    };

    format!(
        "- {} ~ {}: {}{} (#{})",
        start_str, end_str, description, tags, entry.id
    )
}

/// 受け取った変更を標準出力に表示するhandler。空の分類は表示しない。
pub struct ConsoleChangeHandler {
    event: TogglEvent,
}

impl ConsoleChangeHandler {
    pub fn new(event: TogglEvent) -> Self {
        Self { event }
    }
}

#[async_trait]
impl EventHandler for ConsoleChangeHandler {
    async fn handle(&self, entries: &[TimeEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut stdout = std::io::stdout().lock();
        ConsoleMarkdownList::new(&mut stdout).show_changes(self.event, entries)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone, Utc};
    use rstest::rstest;

    use super::{format_entry, ConsoleMarkdownList, ConsolePresenter};
    use crate::events::TogglEvent;
    use crate::time_entry::TimeEntry;

    /// 正常系のテスト。
    #[rstest]
    #[case::no_entry(&[], "")]
    #[case::single(
        &[dummy_entry(1)],
        &expected_output(&dummy_entry(1)),
    )]
    #[case::no_stop(
        &[dummy_entry(4)],
        &expected_output(&dummy_entry(4)),
    )]
    #[case::double(
        &[dummy_entry(1), dummy_entry(2)],
        &[expected_output(&dummy_entry(1)),expected_output(&dummy_entry(2))].join(""),
    )]
    #[case::sort_with_start_time(
        &[dummy_entry(2), dummy_entry(1)],
        &[expected_output(&dummy_entry(1)),expected_output(&dummy_entry(2))].join(""),
    )]
    #[case::no_sort_with_same_start_time(
        &[dummy_entry(3), dummy_entry(2)],
        &[expected_output(&dummy_entry(3)),expected_output(&dummy_entry(2))].join(""),
    )]
    fn test_show_time_entries(#[case] input: &[TimeEntry], #[case] expected: &str) {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter.show_time_entries(input).unwrap();

        assert_eq!(String::from_utf8(writer).unwrap(), expected);
    }

    /// 変更は並び替えずに見出し付きで表示する。
    #[test]
    fn test_show_changes_keeps_order() {
        let mut writer = Vec::new();
        let mut presenter = ConsoleMarkdownList::new(&mut writer);

        presenter
            .show_changes(
                TogglEvent::TimeEntryRemoved,
                &[dummy_entry(2), dummy_entry(1)],
            )
            .unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            format!(
                "## TimeEntryRemoved (2)\n{}{}",
                expected_output(&dummy_entry(2)),
                expected_output(&dummy_entry(1))
            )
        );
    }

    #[test]
    fn test_format_entry_with_tags() {
        let mut entry = dummy_entry(4);
        entry.tags = vec!["a".to_string(), "b".to_string()];
        entry.description = None;

        assert!(format_entry(&entry).ends_with(":  [a, b] (#4)"));
        assert!(format_entry(&entry).contains("~ now:"));
    }

    /// テスト用にダミーのTimeEntryを作成する。
    fn dummy_entry(pattern: u8) -> TimeEntry {
        let (description, start, stop) = match pattern {
            1 => ("entry1", 1, Some(2)),
            2 => ("entry2", 3, Some(4)),
            3 => ("entry3", 3, Some(5)),
            4 => ("entry4", 5, None),
            _ => panic!("Invalid pattern: {}", pattern),
        };
        TimeEntry {
            id: pattern as i64,
            workspace_id: None,
            project_id: None,
            billable: false,
            description: Some(description.to_string()),
            start: Utc.with_ymd_and_hms(2021, 1, 1, start, 0, 0).unwrap(),
            stop: stop.map(|hour| Utc.with_ymd_and_hms(2021, 1, 1, hour, 0, 0).unwrap()),
            duration: 3600, // 利用しないのでなんでも良い
            tags: vec![],
            at: None,
        }
    }

    /// テスト用に出力の1 time entryに対する期待値の文字列を作成する。
    fn expected_output(entry: &TimeEntry) -> String {
        let start_str = entry
            .start
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();
        let end_str = entry
            .stop
            .map(|stop| stop.with_timezone(&Local).format("%H:%M").to_string())
            .unwrap_or_else(|| "now".to_string());
        format!(
            "- {} ~ {}: {} (#{})\n",
            start_str,
            end_str,
            entry.description.as_deref().unwrap_or_default(),
            entry.id
        )
    }
}
