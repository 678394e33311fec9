//! Per-record undo journal.
//!
//! Loading commits every mutation as it happens; there is no multi-record
//! transaction. The journal only remembers what the *current* record changed
//! so a failure part-way through one record can be undone without touching
//! the records before it.

use crate::{NodeId, RelationKind};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    CreateNode {
        id: NodeId,
    },
    AddEdge {
        source: NodeId,
        relation: RelationKind,
        target: NodeId,
    },
    RemoveEdge {
        source: NodeId,
        relation: RelationKind,
        target: NodeId,
    },
    /// `updated_on` of `id` was bumped; `previous` is the value to restore.
    Touch {
        id: NodeId,
        previous: DateTime<Utc>,
    },
}

#[derive(Debug, Default)]
pub struct RecordJournal {
    entries: Option<Vec<JournalEntry>>,
}

impl RecordJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a record. An already open record is discarded (its mutations stay
    /// committed).
    pub fn begin(&mut self) {
        self.entries = Some(Vec::new());
    }

    pub fn is_open(&self) -> bool {
        self.entries.is_some()
    }

    /// Remember an entry if a record is open.
    pub fn push(&mut self, entry: JournalEntry) {
        if let Some(entries) = self.entries.as_mut() {
            entries.push(entry);
        }
    }

    /// Close the record, returning its entries in the order they happened.
    pub fn take(&mut self) -> Option<Vec<JournalEntry>> {
        self.entries.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_only_kept_while_open() {
        let mut journal = RecordJournal::new();
        journal.push(JournalEntry::CreateNode { id: NodeId::new(0) });
        assert!(journal.take().is_none());

        journal.begin();
        journal.push(JournalEntry::CreateNode { id: NodeId::new(1) });
        let entries = journal.take().unwrap_or_default();
        assert_eq!(entries, vec![JournalEntry::CreateNode { id: NodeId::new(1) }]);
        assert!(!journal.is_open());
    }
}
