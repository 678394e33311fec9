//! Load outcomes.

use glossary_graph::{EntityKind, RelationKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Something that happened while applying one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LoadEvent {
    Created {
        kind: EntityKind,
        key: String,
    },
    DuplicateSkipped {
        kind: EntityKind,
        key: String,
    },
    MissingReference {
        kind: EntityKind,
        key: String,
        field: String,
        target: EntityKind,
        /// The natural key that did not resolve; empty when the field was absent.
        value: String,
    },
    StubCreated {
        kind: EntityKind,
        key: String,
        referenced_by: EntityKind,
    },
    StoreError {
        kind: EntityKind,
        key: String,
        message: String,
    },
    InvalidRecord {
        kind: EntityKind,
        reason: String,
    },
    SelfRelation {
        key: String,
    },
    EdgeAdded {
        relation: RelationKind,
    },
    EdgeRemoved {
        relation: RelationKind,
    },
}

impl LoadEvent {
    /// Message for events that end up in the warning list.
    fn warning(&self) -> Option<String> {
        match self {
            LoadEvent::Created { .. }
            | LoadEvent::EdgeAdded { .. }
            | LoadEvent::EdgeRemoved { .. } => None,
            LoadEvent::DuplicateSkipped { kind, key } => {
                Some(format!("{kind} `{key}` already exists; kept the existing node"))
            }
            LoadEvent::MissingReference {
                kind,
                key,
                field,
                target,
                value,
            } if value.is_empty() => Some(format!(
                "{kind} `{key}` has no {field}; {target} reference left unset"
            )),
            LoadEvent::MissingReference {
                kind,
                key,
                field,
                target,
                value,
            } => Some(format!(
                "{kind} `{key}`: {field} `{value}` is not a known {target}"
            )),
            LoadEvent::StubCreated {
                kind,
                key,
                referenced_by,
            } => Some(format!(
                "created stub {kind} `{key}` for a {referenced_by} reference"
            )),
            LoadEvent::StoreError { kind, key, message } => Some(format!(
                "{kind} `{key}` rolled back: {message}"
            )),
            LoadEvent::InvalidRecord { kind, reason } => {
                Some(format!("skipped {kind} record: {reason}"))
            }
            LoadEvent::SelfRelation { key } => {
                Some(format!("term `{key}` cannot be related to itself; ignored"))
            }
        }
    }
}

/// Per-kind node outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub created: usize,
    pub duplicate_skipped: usize,
    pub missing_reference: usize,
    pub stub_created: usize,
    pub store_error: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCounts {
    pub added: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub section: String,
    pub record: usize,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.section, self.record, self.message)
    }
}

/// Everything one load did, complete even when some records failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub kinds: BTreeMap<EntityKind, KindCounts>,
    pub edges: BTreeMap<RelationKind, EdgeCounts>,
    pub warnings: Vec<Warning>,
    pub unknown_sections: Vec<String>,
    pub records: usize,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self, kind: EntityKind) -> KindCounts {
        self.kinds.get(&kind).copied().unwrap_or_default()
    }

    pub fn edge_counts(&self, relation: RelationKind) -> EdgeCounts {
        self.edges.get(&relation).copied().unwrap_or_default()
    }

    pub fn total_created(&self) -> usize {
        self.kinds.values().map(|c| c.created).sum()
    }

    pub fn total_store_errors(&self) -> usize {
        self.kinds.values().map(|c| c.store_error).sum()
    }

    /// Fold one event of `section[record]` into the totals.
    pub fn record(&mut self, section: &str, record: usize, event: &LoadEvent) {
        match event {
            LoadEvent::Created { kind, .. } => self.kind_mut(*kind).created += 1,
            LoadEvent::DuplicateSkipped { kind, .. } => {
                self.kind_mut(*kind).duplicate_skipped += 1
            }
            LoadEvent::MissingReference { kind, .. } => {
                self.kind_mut(*kind).missing_reference += 1
            }
            LoadEvent::StubCreated { kind, .. } => self.kind_mut(*kind).stub_created += 1,
            LoadEvent::StoreError { kind, .. } => self.kind_mut(*kind).store_error += 1,
            LoadEvent::InvalidRecord { kind, .. } => self.kind_mut(*kind).invalid += 1,
            LoadEvent::SelfRelation { .. } => {}
            LoadEvent::EdgeAdded { relation } => self.edge_mut(*relation).added += 1,
            LoadEvent::EdgeRemoved { relation } => self.edge_mut(*relation).removed += 1,
        }

        if let Some(message) = event.warning() {
            tracing::warn!(section, record, "{message}");
            self.warnings.push(Warning {
                section: section.to_string(),
                record,
                message,
            });
        }
    }

    fn kind_mut(&mut self, kind: EntityKind) -> &mut KindCounts {
        self.kinds.entry(kind).or_default()
    }

    fn edge_mut(&mut self, relation: RelationKind) -> &mut EdgeCounts {
        self.edges.entry(relation).or_default()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<14} {:>8} {:>10} {:>8} {:>6} {:>7} {:>8}",
            "kind", "created", "duplicate", "missing", "stubs", "errors", "invalid"
        )?;
        for (kind, c) in &self.kinds {
            writeln!(
                f,
                "{:<14} {:>8} {:>10} {:>8} {:>6} {:>7} {:>8}",
                kind.as_str(),
                c.created,
                c.duplicate_skipped,
                c.missing_reference,
                c.stub_created,
                c.store_error,
                c.invalid
            )?;
        }
        for (relation, e) in &self.edges {
            writeln!(f, "{:<14} +{} -{}", relation.as_str(), e.added, e.removed)?;
        }
        for section in &self.unknown_sections {
            writeln!(f, "unknown section `{section}` ignored")?;
        }
        write!(
            f,
            "{} records, {} warnings",
            self.records,
            self.warnings.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_warnings_but_creations_are_not() {
        let mut report = LoadReport::new();
        report.record(
            "term_status",
            0,
            &LoadEvent::Created {
                kind: EntityKind::TermStatus,
                key: "Draft".into(),
            },
        );
        report.record(
            "term_status",
            1,
            &LoadEvent::DuplicateSkipped {
                kind: EntityKind::TermStatus,
                key: "Draft".into(),
            },
        );

        let counts = report.counts(EntityKind::TermStatus);
        assert_eq!(counts.created, 1);
        assert_eq!(counts.duplicate_skipped, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].record, 1);
    }

    #[test]
    fn missing_reference_message_names_the_value() {
        let mut report = LoadReport::new();
        report.record(
            "rules",
            3,
            &LoadEvent::MissingReference {
                kind: EntityKind::Rule,
                key: "R1".into(),
                field: "terms".into(),
                target: EntityKind::Term,
                value: "Ghost".into(),
            },
        );
        assert_eq!(
            report.warnings[0].to_string(),
            "rules[3]: rule `R1`: terms `Ghost` is not a known term"
        );
    }

    #[test]
    fn serializes_kinds_by_name() {
        let mut report = LoadReport::new();
        report.record(
            "person",
            0,
            &LoadEvent::Created {
                kind: EntityKind::Person,
                key: "Jane".into(),
            },
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kinds"]["person"]["created"], 1);
    }
}
