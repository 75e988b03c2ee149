use std::time::Duration;

use thiserror::Error;

/// connectorが呼び出し元に返す型付きのエラー。
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid event type: {0}")]
    InvalidEventType(String),

    #[error("Fetching time entries did not finish within {0:?}")]
    FetchTimeout(Duration),

    #[error("{0} must be set")]
    MissingConfig(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidConfig { name: &'static str, value: String },
}
