//! Glossary Graph Store
//!
//! The relational entity graph behind the business glossary: terms, rules,
//! people, categories, data-asset lineage (location → table → column) and
//! documents, connected by typed edges.
//!
//! ```text
//!   ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!   │  NodeStore   │    │  EdgeStore   │    │   Journal    │
//!   │ (arena, one  │    │ (bitmap sets │    │ (per-record  │
//!   │  slot/node)  │    │  fwd + back) │    │   undo log)  │
//!   └──────┬───────┘    └──────┬───────┘    └──────┬───────┘
//!          └───────────────────┼───────────────────┘
//!                              ▼
//!                     ┌─────────────────┐
//!                     │   MemoryStore   │──── snapshot (.gldb)
//!                     └─────────────────┘
//! ```
//!
//! ## Key properties
//!
//! - **Surrogate ids stay inside**: `NodeId` is an arena index. Everything that
//!   leaves the store (dumps, exports) is expressed with natural keys.
//! - **Edges are sets**: adjacency is held in roaring bitmaps keyed by
//!   `(source, relation)`, so a duplicate `(A, B)` pair cannot exist.
//! - **Record granularity**: callers bracket each logical record with
//!   `begin_record`/`commit_record`; `rollback_record` undoes exactly that
//!   record's mutations.
//! - **No cycles through ownership**: the symmetric term↔term relation is two
//!   index entries, never mutually-owning references.

pub mod edges;
pub mod journal;
pub mod kind;
pub mod memory;
pub mod nodes;
pub mod snapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use edges::EdgeStore;
pub use journal::{JournalEntry, RecordJournal};
pub use kind::{EntityKind, RelationKind};
pub use memory::{DocumentHook, MemoryStore};
pub use nodes::NodeStore;

/// Attribute map of a node: field name → text value.
pub type Attrs = BTreeMap<String, String>;

// ============================================================================
// Node identity and payload
// ============================================================================

/// Surrogate id of a node (arena index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the glossary graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: EntityKind,
    pub attrs: Attrs,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl Node {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("relation {relation} expects a {expected} {end}, found {found}")]
    KindMismatch {
        relation: RelationKind,
        end: &'static str,
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("relation {0} is not functional")]
    NotFunctional(RelationKind),

    #[error("no record is open")]
    NoOpenRecord,

    #[error("{0} cannot run while a record is open")]
    RecordOpen(&'static str),

    #[error("snapshot i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    #[error("store rejected write: {0}")]
    Rejected(String),
}

// ============================================================================
// Store trait
// ============================================================================

/// The store/session handle passed explicitly into loading and dumping.
///
/// Implementations commit each mutation individually; the record bracket only
/// scopes what `rollback_record` undoes. Callers own exclusivity: nothing here
/// locks.
pub trait GraphStore {
    fn create_node(&mut self, kind: EntityKind, attrs: Attrs) -> Result<NodeId, StoreError>;

    fn node(&self, id: NodeId) -> Option<&Node>;

    /// Ids of every live node of `kind`, in creation order.
    fn nodes_of_kind(&self, kind: EntityKind) -> Vec<NodeId>;

    /// Insert `source -[relation]-> target`. Returns `false` when the edge
    /// already existed.
    fn add_edge(
        &mut self,
        source: NodeId,
        relation: RelationKind,
        target: NodeId,
    ) -> Result<bool, StoreError>;

    /// Remove `source -[relation]-> target`. Returns `false` when there was no
    /// such edge.
    fn remove_edge(
        &mut self,
        source: NodeId,
        relation: RelationKind,
        target: NodeId,
    ) -> Result<bool, StoreError>;

    /// Targets of `source` via `relation`, ascending by id.
    fn targets(&self, source: NodeId, relation: RelationKind) -> Vec<NodeId>;

    /// Sources reaching `target` via `relation`, ascending by id.
    fn sources(&self, target: NodeId, relation: RelationKind) -> Vec<NodeId>;

    /// Number of directed edges of `relation`.
    fn edge_count(&self, relation: RelationKind) -> usize;

    fn begin_record(&mut self);

    fn commit_record(&mut self) -> Result<(), StoreError>;

    fn rollback_record(&mut self);

    fn has_edge(&self, source: NodeId, relation: RelationKind, target: NodeId) -> bool {
        self.targets(source, relation).contains(&target)
    }

    /// The single target of a functional relation, if set.
    fn target(&self, source: NodeId, relation: RelationKind) -> Option<NodeId> {
        self.targets(source, relation).into_iter().next()
    }

    /// Point a functional relation at `target`, replacing any previous target.
    /// Returns `false` when it already pointed there.
    fn set_functional(
        &mut self,
        source: NodeId,
        relation: RelationKind,
        target: NodeId,
    ) -> Result<bool, StoreError> {
        if !relation.is_functional() {
            return Err(StoreError::NotFunctional(relation));
        }
        let current = self.targets(source, relation);
        if current.contains(&target) {
            return Ok(false);
        }
        for old in current {
            self.remove_edge(source, relation, old)?;
        }
        self.add_edge(source, relation, target)
    }

    fn node_count(&self, kind: EntityKind) -> usize {
        self.nodes_of_kind(kind).len()
    }
}
