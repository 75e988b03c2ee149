use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error};
#[cfg(test)]
use mockall::automock;

use crate::error::ConnectorError;
use crate::time_entry::TimeEntry;

/// 購読できるイベントの種類。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TogglEvent {
    TimeEntryAdded,
    TimeEntryModified,
    TimeEntryRemoved,
}

impl TogglEvent {
    /// 配信する順序。
    pub const ALL: [TogglEvent; 3] = [
        TogglEvent::TimeEntryAdded,
        TogglEvent::TimeEntryModified,
        TogglEvent::TimeEntryRemoved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TogglEvent::TimeEntryAdded => "TimeEntryAdded",
            TogglEvent::TimeEntryModified => "TimeEntryModified",
            TogglEvent::TimeEntryRemoved => "TimeEntryRemoved",
        }
    }
}

impl fmt::Display for TogglEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TogglEvent {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TogglEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| ConnectorError::InvalidEventType(s.to_string()))
    }
}

/// イベント発生時に呼ばれるhandler。
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 1回のpollで検出された、あるイベント種別の全time entryを受け取る。
    async fn handle(&self, entries: &[TimeEntry]) -> Result<()>;
}

/// イベントの購読と配信を行うregistry。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventRegistry: Send + Sync {
    /// handlerを登録し、登録に使ったidを返す。
    fn register(&mut self, event: TogglEvent, handler: Arc<dyn EventHandler>, id: String) -> String;

    /// `event`を購読している全handlerを呼び、全て完了するまで待つ。
    async fn fire(&self, event: TogglEvent, entries: Vec<TimeEntry>) -> Result<()>;
}

struct Subscription {
    id: String,
    event: TogglEvent,
    handler: Arc<dyn EventHandler>,
}

/// プロセス内でhandlerを順番に呼び出す`EventRegistry`。
///
/// handlerが失敗してもログに出すだけで、残りのhandlerは呼び出す。
/// 同じidで登録し直した場合は古い購読を置き換える。
#[derive(Default)]
pub struct EventManager {
    subscriptions: Vec<Subscription>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

#[async_trait]
impl EventRegistry for EventManager {
    fn register(&mut self, event: TogglEvent, handler: Arc<dyn EventHandler>, id: String) -> String {
        self.subscriptions.retain(|subscription| subscription.id != id);
        self.subscriptions.push(Subscription {
            id: id.clone(),
            event,
            handler,
        });
        debug!("Registered {} handler: {}", event, id);
        id
    }

    async fn fire(&self, event: TogglEvent, entries: Vec<TimeEntry>) -> Result<()> {
        for subscription in self.subscriptions.iter().filter(|s| s.event == event) {
            if let Err(err) = subscription.handler.handle(&entries).await {
                error!("Handler {} failed for {}: {:#}", subscription.id, event, err);
            }
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::recording::RecordingHandler;
    use super::{EventManager, EventRegistry, TogglEvent};
    use crate::error::ConnectorError;
    use crate::time_entry::fixtures::entry;

    #[rstest]
    #[case("TimeEntryAdded", TogglEvent::TimeEntryAdded)]
    #[case("TimeEntryModified", TogglEvent::TimeEntryModified)]
    #[case("TimeEntryRemoved", TogglEvent::TimeEntryRemoved)]
    fn test_parse_event(#[case] input: &str, #[case] expected: TogglEvent) {
        assert_eq!(input.parse::<TogglEvent>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[rstest]
    #[case("TimeEntryArchived")]
    #[case("timeentryadded")]
    #[case("")]
    fn test_parse_invalid_event(#[case] input: &str) {
        let err = input.parse::<TogglEvent>().unwrap_err();

        assert!(matches!(err, ConnectorError::InvalidEventType(ref t) if t == input));
    }

    /// 購読しているイベントのhandlerだけが呼ばれることを確認する。
    #[tokio::test]
    async fn test_fire_only_matching_handlers() {
        let added = Arc::new(RecordingHandler::default());
        let removed = Arc::new(RecordingHandler::default());
        let mut manager = EventManager::new();
        manager.register(TogglEvent::TimeEntryAdded, added.clone(), "a".to_string());
        manager.register(TogglEvent::TimeEntryRemoved, removed.clone(), "r".to_string());

        manager
            .fire(TogglEvent::TimeEntryAdded, vec![entry(1, 10, "A")])
            .await
            .unwrap();

        assert_eq!(added.calls(), vec![vec![entry(1, 10, "A")]]);
        assert!(removed.calls().is_empty());
    }

    /// 失敗したhandlerがあっても他のhandlerは呼ばれる。
    #[tokio::test]
    async fn test_fire_continues_after_handler_error() {
        let failing = Arc::new(RecordingHandler::failing());
        let ok = Arc::new(RecordingHandler::default());
        let mut manager = EventManager::new();
        manager.register(TogglEvent::TimeEntryAdded, failing.clone(), "1".to_string());
        manager.register(TogglEvent::TimeEntryAdded, ok.clone(), "2".to_string());

        let result = manager.fire(TogglEvent::TimeEntryAdded, vec![]).await;

        assert!(result.is_ok());
        assert_eq!(failing.calls().len(), 1);
        assert_eq!(ok.calls().len(), 1);
    }

    #[test]
    fn test_register_same_id_replaces() {
        let mut manager = EventManager::new();
        let first = Arc::new(RecordingHandler::default());
        let second = Arc::new(RecordingHandler::default());

        manager.register(TogglEvent::TimeEntryAdded, first, "same".to_string());
        let id = manager.register(TogglEvent::TimeEntryRemoved, second, "same".to_string());

        assert_eq!(id, "same");
        assert_eq!(manager.len(), 1);
    }
}
