//! In-memory `GraphStore`.

use crate::edges::EdgeStore;
use crate::journal::{JournalEntry, RecordJournal};
use crate::nodes::NodeStore;
use crate::{Attrs, EntityKind, GraphStore, Node, NodeId, RelationKind, StoreError};
use chrono::Utc;

/// Notified after a document node has been removed from the store.
///
/// A document may be backed by an uploaded file; whoever registers the hook
/// decides what happens to that file. The store itself only guarantees the
/// call happens once the node and its edges are gone.
pub trait DocumentHook: Send + Sync {
    fn document_removed(&self, document: &Node);
}

/// The default store: node arena + edge sets + per-record journal.
#[derive(Default)]
pub struct MemoryStore {
    pub(crate) nodes: NodeStore,
    pub(crate) edges: EdgeStore,
    journal: RecordJournal,
    document_hook: Option<Box<dyn DocumentHook>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(nodes: NodeStore, edges: EdgeStore) -> Self {
        Self {
            nodes,
            edges,
            journal: RecordJournal::new(),
            document_hook: None,
        }
    }

    /// Total number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total number of directed edges.
    pub fn total_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn set_document_hook(&mut self, hook: Box<dyn DocumentHook>) {
        self.document_hook = Some(hook);
    }

    /// Delete a document and every edge touching it, then notify the hook.
    ///
    /// This is an editing operation for callers outside the loader; it is not
    /// journaled and refuses to run inside an open record.
    pub fn remove_document(&mut self, id: NodeId) -> Result<Node, StoreError> {
        if self.journal.is_open() {
            return Err(StoreError::RecordOpen("document removal"));
        }
        let kind = self.kind_of(id)?;
        if kind != EntityKind::Document {
            return Err(StoreError::Rejected(format!(
                "{id} is a {kind}, not a document"
            )));
        }

        let detached = self.edges.detach(id.raw());
        let node = self.nodes.remove(id).ok_or(StoreError::UnknownNode(id))?;
        tracing::debug!(
            document = %node.attr("name").unwrap_or_default(),
            edges = detached.len(),
            "removed document"
        );

        if let Some(hook) = &self.document_hook {
            hook.document_removed(&node);
        }
        Ok(node)
    }

    fn kind_of(&self, id: NodeId) -> Result<EntityKind, StoreError> {
        self.nodes
            .get(id)
            .map(|n| n.kind)
            .ok_or(StoreError::UnknownNode(id))
    }

    fn check_endpoints(
        &self,
        source: NodeId,
        relation: RelationKind,
        target: NodeId,
    ) -> Result<(), StoreError> {
        let (want_source, want_target) = relation.endpoints();
        let found = self.kind_of(source)?;
        if found != want_source {
            return Err(StoreError::KindMismatch {
                relation,
                end: "source",
                expected: want_source,
                found,
            });
        }
        let found = self.kind_of(target)?;
        if found != want_target {
            return Err(StoreError::KindMismatch {
                relation,
                end: "target",
                expected: want_target,
                found,
            });
        }
        Ok(())
    }

    fn touch(&mut self, id: NodeId) {
        let now = Utc::now();
        if let Some(node) = self.nodes.get_mut(id) {
            let previous = node.updated_on;
            node.updated_on = now;
            self.journal.push(JournalEntry::Touch { id, previous });
        }
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::CreateNode { id } => {
                self.edges.detach(id.raw());
                self.nodes.remove(id);
            }
            JournalEntry::AddEdge {
                source,
                relation,
                target,
            } => {
                self.edges.remove(source.raw(), relation, target.raw());
            }
            JournalEntry::RemoveEdge {
                source,
                relation,
                target,
            } => {
                self.edges.insert(source.raw(), relation, target.raw());
            }
            JournalEntry::Touch { id, previous } => {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.updated_on = previous;
                }
            }
        }
    }
}

impl GraphStore for MemoryStore {
    fn create_node(&mut self, kind: EntityKind, attrs: Attrs) -> Result<NodeId, StoreError> {
        let id = self.nodes.insert(kind, attrs, Utc::now());
        self.journal.push(JournalEntry::CreateNode { id });
        Ok(id)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn nodes_of_kind(&self, kind: EntityKind) -> Vec<NodeId> {
        self.nodes.by_kind(kind)
    }

    fn add_edge(
        &mut self,
        source: NodeId,
        relation: RelationKind,
        target: NodeId,
    ) -> Result<bool, StoreError> {
        self.check_endpoints(source, relation, target)?;
        if !self.edges.insert(source.raw(), relation, target.raw()) {
            return Ok(false);
        }
        self.journal.push(JournalEntry::AddEdge {
            source,
            relation,
            target,
        });
        self.touch(source);
        Ok(true)
    }

    fn remove_edge(
        &mut self,
        source: NodeId,
        relation: RelationKind,
        target: NodeId,
    ) -> Result<bool, StoreError> {
        if !self.edges.remove(source.raw(), relation, target.raw()) {
            return Ok(false);
        }
        self.journal.push(JournalEntry::RemoveEdge {
            source,
            relation,
            target,
        });
        self.touch(source);
        Ok(true)
    }

    fn targets(&self, source: NodeId, relation: RelationKind) -> Vec<NodeId> {
        self.edges
            .targets(source.raw(), relation)
            .iter()
            .map(NodeId::new)
            .collect()
    }

    fn sources(&self, target: NodeId, relation: RelationKind) -> Vec<NodeId> {
        self.edges
            .sources(target.raw(), relation)
            .iter()
            .map(NodeId::new)
            .collect()
    }

    fn edge_count(&self, relation: RelationKind) -> usize {
        self.edges.count(relation)
    }

    fn begin_record(&mut self) {
        self.journal.begin();
    }

    fn commit_record(&mut self) -> Result<(), StoreError> {
        self.journal.take().map(|_| ()).ok_or(StoreError::NoOpenRecord)
    }

    fn rollback_record(&mut self) {
        let Some(entries) = self.journal.take() else {
            return;
        };
        let undone = entries.len();
        for entry in entries.into_iter().rev() {
            self.undo(entry);
        }
        tracing::debug!(undone, "rolled back record");
    }

    fn has_edge(&self, source: NodeId, relation: RelationKind, target: NodeId) -> bool {
        self.edges.contains(source.raw(), relation, target.raw())
    }

    fn node_count(&self, kind: EntityKind) -> usize {
        self.nodes.count(kind)
    }
}
