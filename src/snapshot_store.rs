use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::Mutex;

use crate::time_entry::Snapshot;

/// 新しいsnapshotを作る処理。`exchange`の中でだけ実行される。
pub type Refresh<'a> = Pin<Box<dyn Future<Output = Result<Snapshot>> + Send + 'a>>;

/// `exchange`の結果。`previous`は初回は`None`になる。
#[derive(Clone, Debug, PartialEq)]
pub struct Exchange {
    pub previous: Option<Snapshot>,
    pub current: Snapshot,
}

/// keyごとにsnapshotを保存するstore。
///
/// `exchange`はkeyごとに不可分でなければならない。同じkeyに対する
/// 2つの`exchange`が同じ`previous`を見ることはない。
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// `refresh`で作ったsnapshotを保存し、直前のsnapshotと一緒に返す。
    ///
    /// `refresh`が失敗した場合は何も保存せずにエラーを返す。
    async fn exchange<'a>(&'a self, key: &'a str, refresh: Refresh<'a>) -> Result<Exchange>;
}

/// メモリ上にsnapshotを保持するstore。
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<HashMap<String, Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Snapshot> {
        self.snapshots.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn exchange<'a>(&'a self, key: &'a str, refresh: Refresh<'a>) -> Result<Exchange> {
        // refreshの間もlockを保持して、同じstoreへのexchangeを直列化する
        let mut snapshots = self.snapshots.lock().await;
        let current = refresh.await?;
        let previous = snapshots.insert(key.to_string(), current.clone());

        Ok(Exchange { previous, current })
    }
}

/// keyごとにJSONファイルとしてsnapshotを保存するstore。
///
/// 書き込みは一時ファイルに書いてからrenameする。
pub struct FileSnapshotStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    /// keyに対応するファイルのパスを返す。
    ///
    /// ファイル名に使えない文字は`_`に置き換える。
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }

    /// 保存されたsnapshotを読み込む。
    ///
    /// ファイルが無い場合と、JSONとして読めない場合は`None`を返す。
    /// 読めないファイルは次の`save`で上書きされる。
    async fn load(path: &Path) -> Result<Option<Snapshot>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read snapshot: {}", path.display()))
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!("Ignoring unreadable snapshot {}: {}", path.display(), err);
                Ok(None)
            }
        }
    }

    async fn save(&self, path: &Path, snapshot: &Snapshot) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", self.dir.display()))?;
        let bytes = serde_json::to_vec(snapshot).context("Failed to serialize snapshot")?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write snapshot: {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace snapshot: {}", path.display()))?;

        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn exchange<'a>(&'a self, key: &'a str, refresh: Refresh<'a>) -> Result<Exchange> {
        let _guard = self.lock.lock().await;
        let path = self.path_for(key);
        let previous = Self::load(&path).await?;
        let current = refresh.await?;
        self.save(&path, &current).await?;
        debug!(
            "Saved snapshot with {} entries to {}",
            current.len(),
            path.display()
        );

        Ok(Exchange { previous, current })
    }
}
