use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;

use crate::error::ConnectorError;

pub const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v9";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// connectorの設定。
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_token: String,
    pub api_url: String,
    /// 書き込み系のAPIで使うworkspace。
    pub workspace_id: Option<i64>,
    pub poll_interval: Duration,
    /// `None`の場合はtime entryの取得にタイムアウトを設けない。
    pub fetch_timeout: Option<Duration>,
    /// snapshotを保存するディレクトリ。
    pub storage_dir: PathBuf,
}

impl Config {
    /// 環境変数から設定を読み込む。
    ///
    /// `TOGGL_API_TOKEN`が設定されていない場合はエラーを返す。
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// `lookup`で取得した値から設定を組み立てる。
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup("TOGGL_API_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or(ConnectorError::MissingConfig("TOGGL_API_TOKEN"))?;
        let api_url = lookup("TOGGL_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let workspace_id = parse_optional::<i64>(&lookup, "TOGGL_WORKSPACE_ID")?;
        let poll_interval = parse_optional::<u64>(&lookup, "TOGGL_POLL_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(ConnectorError::InvalidConfig {
                name: "TOGGL_POLL_INTERVAL_SECS",
                value: "0".to_string(),
            }
            .into());
        }
        // 0はタイムアウト無しを表す
        let fetch_timeout = match parse_optional::<u64>(&lookup, "TOGGL_FETCH_TIMEOUT_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_FETCH_TIMEOUT),
        };
        let storage_dir = lookup("TOGGL_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_storage_dir);

        Ok(Self {
            api_token,
            api_url,
            workspace_id,
            poll_interval,
            fetch_timeout,
            storage_dir,
        })
    }
}

/// snapshotの既定の保存先。
///
/// Linuxでは`~/.local/share/toggl-connector`。
pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("toggl-connector")
}

fn parse_optional<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConnectorError> {
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| ConnectorError::InvalidConfig { name, value })
        })
        .transpose()
}
