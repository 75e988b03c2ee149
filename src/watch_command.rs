use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};

use crate::config::Config;
use crate::connector::TogglConnector;
use crate::console::ConsoleChangeHandler;
use crate::events::{EventManager, TogglEvent};
use crate::snapshot_store::FileSnapshotStore;
use crate::toggl::TogglClient;

/// time entryの変更を監視して表示するサブコマンド。
#[derive(Debug, clap::Args)]
pub struct WatchArgs {
    #[clap(
        short = 'i',
        long = "interval",
        help = "Polling interval in seconds (defaults to TOGGL_POLL_INTERVAL_SECS)"
    )]
    pub interval: Option<u64>,

    #[clap(long = "once", help = "Poll once and exit")]
    pub once: bool,
}

/// `watch`サブコマンドの処理を行う。
///
/// 前回のsnapshotはファイルに保存されるため、再起動しても変更を検出できる。
/// `--once`を指定しない場合はCtrl-Cで終了するまでpollを続ける。
pub async fn watch_command(args: WatchArgs, config: &Config) -> Result<()> {
    let period = args
        .interval
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(config.poll_interval);

    let mut connector = TogglConnector::new(
        "cli",
        TogglClient::new(config),
        FileSnapshotStore::new(&config.storage_dir),
        EventManager::new(),
    )
    .with_fetch_timeout(config.fetch_timeout);
    for event in TogglEvent::ALL {
        connector
            .on(
                event.as_str(),
                Arc::new(ConsoleChangeHandler::new(event)),
                None,
            )
            .with_context(|| format!("Failed to register {} handler", event))?;
    }

    if args.once {
        connector.on_interval().await?;
        return Ok(());
    }

    info!(
        "Watching time entries every {:?} (snapshots in {})",
        period,
        config.storage_dir.display()
    );
    connector
        .run(period, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", err);
                std::future::pending::<()>().await;
            }
        })
        .await
}
