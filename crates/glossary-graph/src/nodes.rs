//! Node arena with a per-kind bitmap index.

use crate::{Attrs, EntityKind, Node, NodeId};
use chrono::{DateTime, Utc};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arena of nodes: `NodeId` is the slot index.
///
/// Removed nodes leave an empty slot so ids of later nodes stay stable;
/// trailing empty slots are trimmed.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NodeStore {
    slots: Vec<Option<Node>>,
    /// kind -> bitmap of live node ids
    kind_index: HashMap<EntityKind, RoaringBitmap>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.kind_index.values().map(|ids| ids.len() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a node.
    pub fn insert(&mut self, kind: EntityKind, attrs: Attrs, now: DateTime<Utc>) -> NodeId {
        let id = NodeId::new(self.slots.len() as u32);
        self.slots.push(Some(Node {
            id,
            kind,
            attrs,
            created_on: now,
            updated_on: now,
        }));
        self.kind_index
            .entry(kind)
            .or_insert_with(RoaringBitmap::new)
            .insert(id.raw());
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.raw() as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.raw() as usize)?.as_mut()
    }

    /// Live ids of `kind`, ascending.
    pub fn by_kind(&self, kind: EntityKind) -> Vec<NodeId> {
        self.kind_index
            .get(&kind)
            .map(|ids| ids.iter().map(NodeId::new).collect())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.kind_index
            .get(&kind)
            .map(|ids| ids.len() as usize)
            .unwrap_or(0)
    }

    /// Remove a node, returning it.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.slots.get_mut(id.raw() as usize)?.take()?;
        if let Some(ids) = self.kind_index.get_mut(&node.kind) {
            ids.remove(id.raw());
        }
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        Some(node)
    }
}
