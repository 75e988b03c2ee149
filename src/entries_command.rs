use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;

use crate::datetime::{self, local_day_range, parse_date};
use crate::time_entry::TimeEntry;
use crate::toggl::TogglRepository;

/// 1日分のtime entryを表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct EntriesArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    pub date: Option<DateTime<Utc>>,
}

pub struct EntriesCommand<'a, T: TogglRepository> {
    toggl_client: &'a T,
}

impl<'a, T: TogglRepository> EntriesCommand<'a, T> {
    /// 新しい`EntriesCommand`を返す。
    ///
    /// # Arguments
    /// * `toggl_client` - Toggl APIと通信するためのリポジトリ
    pub fn new(toggl_client: &'a T) -> Self {
        Self { toggl_client }
    }

    /// `entries`サブコマンドの処理を行う。
    ///
    /// Localタイムゾーンで指定された日付の00:00:00から始まる1日のタイムエントリーを取得する。
    /// 日付が指定されていない場合は、Localタイムゾーンで現在の日付を利用する。
    pub async fn run(&self, args: EntriesArgs) -> Result<Vec<TimeEntry>> {
        let date = args.date.unwrap_or_else(datetime::now);
        let (start_at, end_at) = local_day_range(date)?;
        info!("Start at: {}, End at: {}", start_at, end_at);

        let time_entries = self
            .toggl_client
            .read_time_entries(Some(start_at), Some(end_at))
            .await
            .context("Failed to retrieve time entries")?;
        info!("Time entries retrieved successfully.");

        Ok(time_entries)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use chrono::{DateTime, Duration, Local, TimeZone, Utc};
    use mockall::predicate::eq;
    use rstest::rstest;

    use super::{EntriesArgs, EntriesCommand};
    use crate::datetime::{local_day_range, mock_datetime};
    use crate::time_entry::fixtures::entry;
    use crate::toggl::MockTogglRepository;

    /// 日付を指定しない場合は現在の日付を使う。
    #[tokio::test]
    async fn test_entries_command_no_date() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        mock_datetime::set_mock_time(now);
        let (start_at, end_at) = local_day_range(now).unwrap();
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_read_time_entries()
            .with(eq(Some(start_at)), eq(Some(end_at)))
            .times(1)
            .returning(|_, _| Ok(vec![entry(1, 10, "A")]));

        let command = EntriesCommand::new(&toggl);
        let result = command.run(EntriesArgs { date: None }).await;
        mock_datetime::clear_mock_time();

        assert_eq!(result.unwrap(), vec![entry(1, 10, "A")]);
    }

    #[rstest]
    #[case(Local::now())]
    #[case(Local.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())]
    #[tokio::test]
    async fn test_entries_command_with_date(#[case] date: DateTime<Local>) {
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_read_time_entries()
            .withf(|start_at, end_at| match (start_at, end_at) {
                (Some(start_at), Some(end_at)) => *end_at - *start_at == Duration::days(1),
                _ => false,
            })
            .times(1)
            .returning(|_, _| Ok(vec![]));

        let command = EntriesCommand::new(&toggl);
        let result = command
            .run(EntriesArgs {
                date: Some(date.to_utc()),
            })
            .await;

        assert!(result.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_entries_command_error() {
        let mut toggl = MockTogglRepository::new();
        toggl
            .expect_read_time_entries()
            .returning(|_, _| Err(anyhow!("unauthorized")));

        let command = EntriesCommand::new(&toggl);
        let result = command.run(EntriesArgs { date: None }).await;

        assert!(result.is_err());
    }
}
