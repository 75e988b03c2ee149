//! Toggl APIを型付きのactionとして公開し、time entryの変更をpollingで検出して
//! イベントとして配信するconnector。
//!
//! 1回のpollは次の順に進む。
//!
//! 1. `TogglRepository`で現在のtime entryを全て取得する
//! 2. `SnapshotStore::exchange`で前回のsnapshotと入れ替える
//! 3. `diff_time_entries`で追加・変更・削除に分類する
//! 4. `EventRegistry::fire`で分類ごとにhandlerを呼び出す

pub mod actions;
pub mod config;
pub mod connector;
pub mod console;
pub mod datetime;
pub mod diff;
pub mod entries_command;
pub mod error;
pub mod events;
pub mod logger;
pub mod resources;
pub mod snapshot_store;
pub mod time_entry;
pub mod toggl;
pub mod watch_command;

pub use actions::TogglActions;
pub use connector::{TogglConnector, TOGGL_STORAGE_KEY};
pub use diff::{diff_time_entries, ChangeSet};
pub use error::ConnectorError;
pub use events::{EventHandler, EventManager, EventRegistry, TogglEvent};
pub use snapshot_store::{Exchange, FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use time_entry::{Snapshot, TimeEntry};
pub use toggl::{TogglClient, TogglRepository};
