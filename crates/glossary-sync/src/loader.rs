//! Node loader: applies a parsed dataset to a store.
//!
//! Sections are processed in catalog order whatever their order in the file.
//! Each record is one journal record in the store:
//!
//! ```text
//!   begin_record ─► resolve key ─► create | reuse ─► references ─► commit_record
//!                       │                                │
//!                       └────────── StoreError ──────────┴─► rollback_record
//!                                                            + warning, next record
//! ```
//!
//! Only input that is not a section map at all, or a file that cannot be read,
//! stops a load. Everything else is a warning in the report.

use crate::catalog::{self, KindSpec, ReferenceSpec, Section, RELATED_TERMS_FIELD};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::record::{Dataset, Record};
use crate::reconcile::{EdgeReconciler, RefSite};
use crate::report::{LoadEvent, LoadReport};
use crate::resolver::{KeyResolver, NaturalKey};
use glossary_graph::{Attrs, EntityKind, GraphStore, NodeId, RelationKind, StoreError};
use std::collections::BTreeSet;
use std::path::Path;

/// Load a dataset file into `store`.
pub fn load_path<S: GraphStore + ?Sized>(
    store: &mut S,
    path: &Path,
    config: &SyncConfig,
) -> Result<LoadReport> {
    let text = std::fs::read_to_string(path).map_err(|source| SyncError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "loading dataset");
    load_str(store, &text, config)
}

/// Load dataset text into `store`.
pub fn load_str<S: GraphStore + ?Sized>(
    store: &mut S,
    text: &str,
    config: &SyncConfig,
) -> Result<LoadReport> {
    let dataset = Dataset::parse(text)?;
    Ok(Loader::new(store, config).load_dataset(&dataset))
}

pub struct Loader<'a, S: GraphStore + ?Sized> {
    store: &'a mut S,
    config: &'a SyncConfig,
    resolver: KeyResolver,
    report: LoadReport,
}

impl<'a, S: GraphStore + ?Sized> Loader<'a, S> {
    pub fn new(store: &'a mut S, config: &'a SyncConfig) -> Self {
        Self {
            store,
            config,
            resolver: KeyResolver::new(),
            report: LoadReport::new(),
        }
    }

    /// Apply every known section of `dataset` and return the report.
    pub fn load_dataset(mut self, dataset: &Dataset) -> LoadReport {
        for name in dataset.section_names() {
            if Section::from_name(name).is_none() {
                tracing::warn!(section = name, "unknown section ignored");
                self.report.unknown_sections.push(name.to_string());
            }
        }

        for section in catalog::LOAD_ORDER {
            let records = dataset.section(section.name());
            if records.is_empty() {
                continue;
            }
            tracing::info!(section = section.name(), records = records.len(), "loading section");
            for record in records {
                self.report.records += 1;
                match section {
                    Section::Nodes(kind) => self.load_node_record(catalog::spec(kind), record),
                    Section::RelatedTerms => self.load_related_record(record),
                }
            }
        }

        tracing::info!(
            records = self.report.records,
            created = self.report.total_created(),
            warnings = self.report.warnings.len(),
            "load finished"
        );
        self.report
    }

    // ========================================================================
    // Record bracket
    // ========================================================================

    /// Run `apply` as one store record; fold its events into the report only
    /// if it commits.
    fn run_record<F>(&mut self, section: &str, record: usize, kind: EntityKind, key: &str, apply: F)
    where
        F: FnOnce(&mut Self, &mut Vec<LoadEvent>) -> std::result::Result<(), StoreError>,
    {
        let mut events = Vec::new();
        self.store.begin_record();
        let outcome = apply(&mut *self, &mut events).and_then(|()| self.store.commit_record());

        match outcome {
            Ok(()) => {
                for event in &events {
                    self.report.record(section, record, event);
                }
            }
            Err(err) => {
                self.store.rollback_record();
                // Rolled-back creations may still sit in the indexes.
                self.resolver.invalidate_all();
                self.report.record(
                    section,
                    record,
                    &LoadEvent::StoreError {
                        kind,
                        key: key.to_string(),
                        message: err.to_string(),
                    },
                );
            }
        }
    }

    fn invalid(&mut self, section: &str, record: usize, kind: EntityKind, reason: String) {
        self.report
            .record(section, record, &LoadEvent::InvalidRecord { kind, reason });
    }

    fn reconciler<'b>(&'b mut self, events: &'b mut Vec<LoadEvent>) -> EdgeReconciler<'b, S> {
        EdgeReconciler::new(&mut *self.store, &mut self.resolver, self.config, events)
    }

    // ========================================================================
    // Node sections
    // ========================================================================

    fn load_node_record(&mut self, spec: &'static KindSpec, record: &Record) {
        let key_field = spec.key.field();
        let Some(name) = record.key_text(key_field) else {
            self.invalid(
                spec.section,
                record.index,
                spec.kind,
                format!("missing `{key_field}`"),
            );
            return;
        };
        for field in record.field_names() {
            if !spec.knows_field(field) {
                tracing::debug!(section = spec.section, record = record.index, field, "unknown field ignored");
            }
        }

        let name = name.to_string();
        self.run_record(spec.section, record.index, spec.kind, &name, |loader, events| {
            loader.apply_node_record(spec, record, &name, events)
        });
    }

    fn apply_node_record(
        &mut self,
        spec: &'static KindSpec,
        record: &Record,
        name: &str,
        events: &mut Vec<LoadEvent>,
    ) -> std::result::Result<(), StoreError> {
        let site = RefSite {
            kind: spec.kind,
            key: name,
        };

        // The scope of a scoped key is itself a reference; resolve it first
        // and remember the outcome so it is reported once.
        let mut scope: Option<NodeId> = None;
        let mut scope_resolved = false;
        if let Some(scope_ref) = spec.scope_reference() {
            scope = self.resolve_single(site, scope_ref, record, events)?;
            scope_resolved = true;
        }

        let key = NaturalKey::scoped(scope, name);
        let (node, created) = match self.resolver.resolve(&*self.store, spec.kind, &key) {
            Some(existing) => {
                events.push(LoadEvent::DuplicateSkipped {
                    kind: spec.kind,
                    key: name.to_string(),
                });
                (existing, false)
            }
            None => {
                let id = self.store.create_node(spec.kind, node_attrs(spec, record, name))?;
                self.resolver.insert(spec.kind, key, id);
                tracing::debug!(kind = %spec.kind, key = name, id = %id, "created node");
                events.push(LoadEvent::Created {
                    kind: spec.kind,
                    key: name.to_string(),
                });
                (id, true)
            }
        };

        for reference in spec.references {
            if reference.many {
                let values = record.list(reference.field);
                self.reconciler(events)
                    .link_many(site, node, reference, &values)?;
                continue;
            }
            // A duplicate keeps its attributes and single references.
            if !created {
                continue;
            }
            let target = if scope_resolved && spec.key.scope() == Some(reference.field) {
                scope
            } else {
                self.resolve_single(site, reference, record, events)?
            };
            if let Some(target) = target {
                self.reconciler(events).link_one(node, reference, target)?;
            }
        }
        Ok(())
    }

    /// Resolve a single-valued reference field, reporting an absent required
    /// field.
    fn resolve_single(
        &mut self,
        site: RefSite<'_>,
        reference: &ReferenceSpec,
        record: &Record,
        events: &mut Vec<LoadEvent>,
    ) -> std::result::Result<Option<NodeId>, StoreError> {
        let qualifier = reference.qualifier.and_then(|q| record.key_text(q));
        let mut edges = self.reconciler(events);
        match record.key_text(reference.field) {
            Some(value) => edges.resolve_reference(site, reference, value, qualifier),
            None => {
                if reference.required {
                    edges.missing(site, reference, String::new());
                }
                Ok(None)
            }
        }
    }

    // ========================================================================
    // related_terms section
    // ========================================================================

    fn load_related_record(&mut self, record: &Record) {
        let section = Section::RelatedTerms.name();
        let Some(name) = record.key_text("term") else {
            self.invalid(
                section,
                record.index,
                EntityKind::Term,
                "missing `term`".to_string(),
            );
            return;
        };
        let name = name.to_string();
        self.run_record(section, record.index, EntityKind::Term, &name, |loader, events| {
            loader.apply_related_record(record, &name, events)
        });
    }

    fn apply_related_record(
        &mut self,
        record: &Record,
        name: &str,
        events: &mut Vec<LoadEvent>,
    ) -> std::result::Result<(), StoreError> {
        let term_ref = &RELATED_REFERENCE;
        let site = RefSite {
            kind: EntityKind::Term,
            key: name,
        };
        let anchor = ReferenceSpec {
            field: "term",
            ..RELATED_REFERENCE
        };

        let Some(term) = self
            .reconciler(events)
            .resolve_reference(site, &anchor, name, None)?
        else {
            return Ok(());
        };

        let mut desired = BTreeSet::new();
        let mut wanted = BTreeSet::new();
        for value in record.list(RELATED_TERMS_FIELD) {
            let value = value.trim().to_string();
            if value.is_empty() || !wanted.insert(value.clone()) {
                continue;
            }
            if value == name {
                events.push(LoadEvent::SelfRelation {
                    key: name.to_string(),
                });
                continue;
            }
            if let Some(other) = self
                .reconciler(events)
                .resolve_reference(site, term_ref, &value, None)?
            {
                desired.insert(other);
            }
        }

        let diff = self.reconciler(events).reconcile_related(term, &desired)?;
        if !diff.is_empty() {
            tracing::debug!(
                term = name,
                added = diff.added.len(),
                removed = diff.removed.len(),
                "reconciled related terms"
            );
        }
        Ok(())
    }
}

/// Term ↔ term references of a `related_terms` record.
const RELATED_REFERENCE: ReferenceSpec = ReferenceSpec {
    field: RELATED_TERMS_FIELD,
    relation: RelationKind::RelatedTerm,
    required: false,
    many: true,
    qualifier: None,
};

/// Attributes of a new node: the declared fields present in the record.
fn node_attrs(spec: &KindSpec, record: &Record, name: &str) -> Attrs {
    let key_field = spec.key.field();
    let mut attrs = Attrs::new();
    for field in spec.fields {
        if field.name == key_field {
            attrs.insert(key_field.to_string(), name.to_string());
        } else if let Some(value) = record.text(field.name) {
            attrs.insert(field.name.to_string(), value.to_string());
        }
    }
    attrs
}
