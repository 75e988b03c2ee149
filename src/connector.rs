use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info, warn};
use tokio::time::{interval, MissedTickBehavior};

use crate::actions::TogglActions;
use crate::diff::{diff_time_entries, ChangeSet};
use crate::error::ConnectorError;
use crate::events::{EventHandler, EventRegistry, TogglEvent};
use crate::snapshot_store::SnapshotStore;
use crate::time_entry::{snapshot_from_entries, Snapshot};
use crate::toggl::TogglRepository;

/// pollで使うsnapshotの既定のkey。
pub const TOGGL_STORAGE_KEY: &str = "TOGGL_STORAGE_KEY";

/// Toggl APIをactionとして公開し、pollingでtime entryの変更をイベントとして配信する。
pub struct TogglConnector<R, S, E>
where
    R: TogglRepository,
    S: SnapshotStore,
    E: EventRegistry,
{
    id: String,
    actions: TogglActions<R>,
    store: S,
    events: E,
    storage_key: String,
    fetch_timeout: Option<Duration>,
}

impl<R, S, E> TogglConnector<R, S, E>
where
    R: TogglRepository,
    S: SnapshotStore,
    E: EventRegistry,
{
    /// 新しい`TogglConnector`を返す。
    ///
    /// # Arguments
    ///
    /// * `id` - connectorのid。イベントidの既定値に使われる
    /// * `repository` - Toggl APIと通信するためのリポジトリ
    /// * `store` - 前回のpoll結果を保存するstore
    /// * `events` - イベントの購読と配信を行うregistry
    pub fn new(id: impl Into<String>, repository: R, store: S, events: E) -> Self {
        Self {
            id: id.into(),
            actions: TogglActions::new(repository),
            store,
            events,
            storage_key: TOGGL_STORAGE_KEY.to_string(),
            fetch_timeout: None,
        }
    }

    /// snapshotを保存するkeyを変更する。他の用途のkeyと重ねてはいけない。
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// time entryの取得にタイムアウトを設定する。
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn actions(&self) -> &TogglActions<R> {
        &self.actions
    }

    /// イベントを購読する。
    ///
    /// `event_type`が`TimeEntryAdded`, `TimeEntryModified`, `TimeEntryRemoved`の
    /// いずれでもない場合は何も登録せずにエラーを返す。
    /// `event_id`を省略した場合(空文字列を含む)は`TOGGL/<event_type>/<connector id>`を使う。
    pub fn on(
        &mut self,
        event_type: &str,
        handler: Arc<dyn EventHandler>,
        event_id: Option<String>,
    ) -> Result<String, ConnectorError> {
        let event: TogglEvent = event_type.parse()?;
        let event_id = event_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("TOGGL/{}/{}", event, self.id));

        Ok(self.events.register(event, handler, event_id))
    }

    /// 1回分のpollを行う。
    ///
    /// 初回(保存されたsnapshotが無い場合)は差分を計算せず`None`を返す。
    /// time entryの取得に失敗した場合は、snapshotを更新せずイベントも配信しない。
    pub async fn on_interval(&self) -> Result<Option<ChangeSet>> {
        let exchange = self
            .store
            .exchange(&self.storage_key, Box::pin(self.fetch_snapshot()))
            .await?;

        let Some(previous) = exchange.previous else {
            info!(
                "First poll for {}: stored {} time entries",
                self.storage_key,
                exchange.current.len()
            );
            return Ok(None);
        };

        let changes = diff_time_entries(&previous, &exchange.current);
        if changes.is_empty() {
            debug!("No time entry changes");
            return Ok(Some(changes));
        }

        info!(
            "Detected {} changes: {} added, {} modified, {} removed",
            changes.change_count(),
            changes.additions.len(),
            changes.modifications.len(),
            changes.removals.len()
        );
        // 変更が1件でもあれば、空の分類も含めて3種類とも配信する
        for event in TogglEvent::ALL {
            self.events
                .fire(event, changes.entries(event).to_vec())
                .await?;
        }

        Ok(Some(changes))
    }

    /// `shutdown`が完了するまで`period`ごとにpollを行う。
    ///
    /// pollは1回ずつ完了を待ってから次を始めるので、重なって実行されることはない。
    /// 失敗したpollはログに出して次の周期で再試行する。
    pub async fn run<F>(&self, period: Duration, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stopped polling {}", self.id);
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.on_interval().await {
                        warn!("Poll failed: {:#}", err);
                    }
                }
            }
        }
    }

    /// 現在のtime entryを全て取得してsnapshotにする。
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let entries =
            with_timeout(self.fetch_timeout, self.actions.get_time_entries(None, None)).await?;

        Ok(snapshot_from_entries(entries))
    }
}

/// `timeout`を指定した場合は、その時間内に終わらなければ`FetchTimeout`を返す。
async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| ConnectorError::FetchTimeout(timeout))?,
        None => fut.await,
    }
}
