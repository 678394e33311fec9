//! Edge sets with forward and backward indexes.
//!
//! Unlike an append-only edge list, every `(source, relation)` pair maps to a
//! bitmap of targets. Inserting an existing pair is a no-op, which is what
//! makes edge reconciliation idempotent without a separate duplicate check.

use crate::RelationKind;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EdgeStore {
    /// (source, relation) -> targets
    forward: HashMap<(u32, RelationKind), RoaringBitmap>,
    /// (target, relation) -> sources
    backward: HashMap<(u32, RelationKind), RoaringBitmap>,
    /// relation -> number of directed edges
    counts: HashMap<RelationKind, u64>,
}

impl EdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of directed edges.
    pub fn len(&self) -> usize {
        self.counts.values().sum::<u64>() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, relation: RelationKind) -> usize {
        self.counts.get(&relation).copied().unwrap_or(0) as usize
    }

    /// Insert an edge; `false` if it was already present.
    pub fn insert(&mut self, source: u32, relation: RelationKind, target: u32) -> bool {
        let inserted = self
            .forward
            .entry((source, relation))
            .or_insert_with(RoaringBitmap::new)
            .insert(target);
        if inserted {
            self.backward
                .entry((target, relation))
                .or_insert_with(RoaringBitmap::new)
                .insert(source);
            *self.counts.entry(relation).or_insert(0) += 1;
        }
        inserted
    }

    /// Remove an edge; `false` if it was not present.
    pub fn remove(&mut self, source: u32, relation: RelationKind, target: u32) -> bool {
        let Some(targets) = self.forward.get_mut(&(source, relation)) else {
            return false;
        };
        if !targets.remove(target) {
            return false;
        }
        if targets.is_empty() {
            self.forward.remove(&(source, relation));
        }
        if let Some(sources) = self.backward.get_mut(&(target, relation)) {
            sources.remove(source);
            if sources.is_empty() {
                self.backward.remove(&(target, relation));
            }
        }
        if let Some(count) = self.counts.get_mut(&relation) {
            *count = count.saturating_sub(1);
        }
        true
    }

    pub fn contains(&self, source: u32, relation: RelationKind, target: u32) -> bool {
        self.forward
            .get(&(source, relation))
            .map(|targets| targets.contains(target))
            .unwrap_or(false)
    }

    pub fn targets(&self, source: u32, relation: RelationKind) -> RoaringBitmap {
        self.forward
            .get(&(source, relation))
            .cloned()
            .unwrap_or_default()
    }

    pub fn sources(&self, target: u32, relation: RelationKind) -> RoaringBitmap {
        self.backward
            .get(&(target, relation))
            .cloned()
            .unwrap_or_default()
    }

    /// Remove every edge touching `node`, returning the removed triples.
    pub fn detach(&mut self, node: u32) -> Vec<(u32, RelationKind, u32)> {
        let mut removed = Vec::new();
        for relation in RelationKind::ALL {
            for target in self.targets(node, relation).iter() {
                if self.remove(node, relation, target) {
                    removed.push((node, relation, target));
                }
            }
            for source in self.sources(node, relation).iter() {
                if self.remove(source, relation, node) {
                    removed.push((source, relation, node));
                }
            }
        }
        removed
    }
}
