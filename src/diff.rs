use crate::events::TogglEvent;
use crate::time_entry::{Snapshot, TimeEntry};

/// 2つのsnapshotの差分。
///
/// `modifications`には新しい値、`removals`には古い値が入る。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    pub additions: Vec<TimeEntry>,
    pub modifications: Vec<TimeEntry>,
    pub removals: Vec<TimeEntry>,
}

impl ChangeSet {
    pub fn change_count(&self) -> usize {
        self.additions.len() + self.modifications.len() + self.removals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }

    /// イベント種別に対応するtime entryを返す。
    pub fn entries(&self, event: TogglEvent) -> &[TimeEntry] {
        match event {
            TogglEvent::TimeEntryAdded => &self.additions,
            TogglEvent::TimeEntryModified => &self.modifications,
            TogglEvent::TimeEntryRemoved => &self.removals,
        }
    }
}

/// 古いsnapshotと新しいsnapshotを比較して差分を返す。
///
/// 結果の順序は新しいsnapshotの列挙順、続いて古いsnapshotの列挙順になる。
pub fn diff_time_entries(old: &Snapshot, new: &Snapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (id, entry) in new {
        match old.get(id) {
            Some(previous) if !entry.is_similar(previous) => {
                changes.modifications.push(entry.clone())
            }
            Some(_) => {}
            None => changes.additions.push(entry.clone()),
        }
    }

    changes.removals = old
        .iter()
        .filter(|(id, _)| !new.contains_key(*id))
        .map(|(_, entry)| entry.clone())
        .collect();

    changes
}
