//! Edge reconciliation.
//!
//! Two algorithms live here:
//!
//! - **Additive** (term categories, rule terms, document types, ...): every
//!   listed key is resolved and linked if not already linked. Nothing is ever
//!   unlinked, so re-running a load cannot lose edges.
//! - **Symmetric set difference** (related terms): the desired set replaces
//!   the current one, and every change is applied to both directions.
//!
//! ```text
//!   current ──┐                 ┌── removed = current − desired ──► unlink A↔t
//!             ├─ related_diff ──┤
//!   desired ──┘                 └── added   = desired − current ──► link   A↔t
//! ```
//!
//! The two directions of a symmetric edge are written one after the other;
//! a failure in between leaves a half pair. `reconcile_related` treats an
//! edge in either direction as "current", so the next run over the same
//! record completes or removes the pair.

use crate::catalog::{self, ReferenceSpec};
use crate::config::SyncConfig;
use crate::report::LoadEvent;
use crate::resolver::{KeyResolver, NaturalKey};
use glossary_graph::{Attrs, EntityKind, GraphStore, NodeId, RelationKind, StoreError};
use std::collections::BTreeSet;

/// `added`/`removed` turning a current set into a desired one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedDiff<T: Ord> {
    pub added: BTreeSet<T>,
    pub removed: BTreeSet<T>,
}

impl<T: Ord> RelatedDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// True set difference in both directions.
pub fn related_diff<T: Ord + Clone>(current: &BTreeSet<T>, desired: &BTreeSet<T>) -> RelatedDiff<T> {
    RelatedDiff {
        added: desired.difference(current).cloned().collect(),
        removed: current.difference(desired).cloned().collect(),
    }
}

/// The record a reference belongs to, for event reporting.
#[derive(Debug, Clone, Copy)]
pub struct RefSite<'a> {
    pub kind: EntityKind,
    pub key: &'a str,
}

/// Resolves references and writes edges for one record.
pub struct EdgeReconciler<'a, S: GraphStore + ?Sized> {
    store: &'a mut S,
    resolver: &'a mut KeyResolver,
    config: &'a SyncConfig,
    events: &'a mut Vec<LoadEvent>,
}

impl<'a, S: GraphStore + ?Sized> EdgeReconciler<'a, S> {
    pub fn new(
        store: &'a mut S,
        resolver: &'a mut KeyResolver,
        config: &'a SyncConfig,
        events: &'a mut Vec<LoadEvent>,
    ) -> Self {
        Self {
            store,
            resolver,
            config,
            events,
        }
    }

    /// Resolve one natural key of `reference`'s target kind.
    ///
    /// `qualifier` names the target's scope when the target kind is scoped;
    /// without it a scoped target resolves only if its name is unique. An
    /// unresolved key becomes a stub when the target kind may be
    /// auto-created, otherwise a `MissingReference` event.
    pub fn resolve_reference(
        &mut self,
        site: RefSite<'_>,
        reference: &ReferenceSpec,
        value: &str,
        qualifier: Option<&str>,
    ) -> Result<Option<NodeId>, StoreError> {
        let target = reference.target();
        let target_spec = catalog::spec(target);

        let found = match (target_spec.scope_reference(), qualifier) {
            (Some(scope_ref), Some(scope_name)) => self
                .resolver
                .resolve_name(&*self.store, scope_ref.target(), scope_name)
                .and_then(|scope| {
                    self.resolver.resolve(
                        &*self.store,
                        target,
                        &NaturalKey::scoped(Some(scope), value),
                    )
                }),
            (Some(_), None) => self.resolver.resolve_name(&*self.store, target, value),
            (None, _) => self
                .resolver
                .resolve(&*self.store, target, &NaturalKey::new(value)),
        };
        if found.is_some() {
            return Ok(found);
        }

        if self.config.allows_stub(target) && !target_spec.is_scoped() {
            let mut attrs = Attrs::new();
            attrs.insert(target_spec.key.field().to_string(), value.to_string());
            let id = self.store.create_node(target, attrs)?;
            self.resolver.insert(target, NaturalKey::new(value), id);
            tracing::debug!(kind = %target, key = value, "created stub");
            self.events.push(LoadEvent::StubCreated {
                kind: target,
                key: value.to_string(),
                referenced_by: site.kind,
            });
            return Ok(Some(id));
        }

        let shown = match qualifier {
            Some(scope) => format!("{scope}.{value}"),
            None => value.to_string(),
        };
        self.missing(site, reference, shown);
        Ok(None)
    }

    /// Report a reference that could not be satisfied.
    pub fn missing(&mut self, site: RefSite<'_>, reference: &ReferenceSpec, value: String) {
        self.events.push(LoadEvent::MissingReference {
            kind: site.kind,
            key: site.key.to_string(),
            field: reference.field.to_string(),
            target: reference.target(),
            value,
        });
    }

    /// Point a functional reference of `source` at `target`.
    pub fn link_one(
        &mut self,
        source: NodeId,
        reference: &ReferenceSpec,
        target: NodeId,
    ) -> Result<(), StoreError> {
        if self
            .store
            .set_functional(source, reference.relation, target)?
        {
            self.edge_added(reference.relation);
        }
        Ok(())
    }

    /// Additively link `source` to every key in `values`.
    pub fn link_many(
        &mut self,
        site: RefSite<'_>,
        source: NodeId,
        reference: &ReferenceSpec,
        values: &[String],
    ) -> Result<(), StoreError> {
        let mut seen = BTreeSet::new();
        for value in values {
            let value = value.trim();
            if value.is_empty() || !seen.insert(value) {
                continue;
            }
            let Some(target) = self.resolve_reference(site, reference, value, None)? else {
                continue;
            };
            if self.store.add_edge(source, reference.relation, target)? {
                self.edge_added(reference.relation);
            }
        }
        Ok(())
    }

    /// Make `term`'s related terms exactly `desired`, in both directions.
    pub fn reconcile_related(
        &mut self,
        term: NodeId,
        desired: &BTreeSet<NodeId>,
    ) -> Result<RelatedDiff<NodeId>, StoreError> {
        let relation = RelationKind::RelatedTerm;
        let mut desired = desired.clone();
        desired.remove(&term);

        let current: BTreeSet<NodeId> = self
            .store
            .targets(term, relation)
            .into_iter()
            .chain(self.store.sources(term, relation))
            .filter(|other| *other != term)
            .collect();
        let diff = related_diff(&current, &desired);

        for &other in &diff.removed {
            self.unlink_pair(term, other)?;
        }
        // Every desired pair is (re)asserted so a half pair gets completed.
        for &other in &desired {
            self.link_pair(term, other)?;
        }
        Ok(diff)
    }

    fn link_pair(&mut self, a: NodeId, b: NodeId) -> Result<(), StoreError> {
        let relation = RelationKind::RelatedTerm;
        for (source, target) in [(a, b), (b, a)] {
            if self.store.add_edge(source, relation, target)? {
                self.edge_added(relation);
            }
        }
        Ok(())
    }

    fn unlink_pair(&mut self, a: NodeId, b: NodeId) -> Result<(), StoreError> {
        let relation = RelationKind::RelatedTerm;
        for (source, target) in [(a, b), (b, a)] {
            if self.store.remove_edge(source, relation, target)? {
                self.events.push(LoadEvent::EdgeRemoved { relation });
            }
        }
        Ok(())
    }

    fn edge_added(&mut self, relation: RelationKind) {
        self.events.push(LoadEvent::EdgeAdded { relation });
    }
}
