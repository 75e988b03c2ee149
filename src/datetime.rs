use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// 現在のUTC時間を取得する。
#[cfg(not(test))]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// `date`を含むLocalタイムゾーンの1日(00:00:00から24時間)をUTCで返す。
pub fn local_day_range(date: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start_at = local_midnight(date.with_timezone(&Local).date_naive())?;
    let end_at = start_at + chrono::Duration::days(1);

    Ok((start_at, end_at))
}

/// `YYYY-MM-DD`をLocalタイムゾーンの00:00:00としてパースする。
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let naive_date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", s))?;

    local_midnight(naive_date)
}

fn local_midnight(date: NaiveDate) -> Result<DateTime<Utc>> {
    let naive_datetime = date
        .and_hms_opt(0, 0, 0)
        .context("Failed to set hour, minute, and second")?;
    let datetime = Local
        .from_local_datetime(&naive_datetime)
        .earliest()
        .context("Failed to convert to DateTime<Local>")?
        .to_utc();

    Ok(datetime)
}
