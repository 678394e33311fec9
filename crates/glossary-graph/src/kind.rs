//! Node and edge kinds of the glossary graph.
//!
//! Kinds are closed enums so that every store operation can be checked
//! against the declared endpoints of a relation. The per-kind metadata used by
//! the loader (natural keys, field lists, load order) lives one layer up, in
//! `glossary_sync::catalog`; this module only knows the shape of the graph.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Entity kinds
// ============================================================================

/// Every kind of node the glossary graph can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Location,
    Person,
    Category,
    TermStatus,
    DocumentType,
    Term,
    Rule,
    Table,
    Column,
    Document,
    Link,
    Note,
}

impl EntityKind {
    pub const ALL: [EntityKind; 12] = [
        EntityKind::Location,
        EntityKind::Person,
        EntityKind::Category,
        EntityKind::TermStatus,
        EntityKind::DocumentType,
        EntityKind::Term,
        EntityKind::Rule,
        EntityKind::Table,
        EntityKind::Column,
        EntityKind::Document,
        EntityKind::Link,
        EntityKind::Note,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Location => "location",
            EntityKind::Person => "person",
            EntityKind::Category => "category",
            EntityKind::TermStatus => "term_status",
            EntityKind::DocumentType => "document_type",
            EntityKind::Term => "term",
            EntityKind::Rule => "rule",
            EntityKind::Table => "table",
            EntityKind::Column => "column",
            EntityKind::Document => "document",
            EntityKind::Link => "link",
            EntityKind::Note => "note",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Relation kinds
// ============================================================================

/// Every kind of edge.
///
/// Direction follows the record that declares the edge: a rule record lists
/// its terms, so `RuleTerm` points from the rule to the term. Functional
/// relations hold at most one target per source (a term's status, a column's
/// table). `RelatedTerm` is the only symmetric relation and is always stored
/// in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    TermCategory,
    RuleTerm,
    ColumnTerm,
    DocumentTerm,
    DocumentRule,
    DocumentType,
    RelatedTerm,
    TermStatus,
    TermOwner,
    TermSteward,
    TableLocation,
    ColumnTable,
    LinkTerm,
    NoteRule,
}

impl RelationKind {
    pub const ALL: [RelationKind; 14] = [
        RelationKind::TermCategory,
        RelationKind::RuleTerm,
        RelationKind::ColumnTerm,
        RelationKind::DocumentTerm,
        RelationKind::DocumentRule,
        RelationKind::DocumentType,
        RelationKind::RelatedTerm,
        RelationKind::TermStatus,
        RelationKind::TermOwner,
        RelationKind::TermSteward,
        RelationKind::TableLocation,
        RelationKind::ColumnTable,
        RelationKind::LinkTerm,
        RelationKind::NoteRule,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::TermCategory => "term_category",
            RelationKind::RuleTerm => "rule_term",
            RelationKind::ColumnTerm => "column_term",
            RelationKind::DocumentTerm => "document_term",
            RelationKind::DocumentRule => "document_rule",
            RelationKind::DocumentType => "document_type",
            RelationKind::RelatedTerm => "related_term",
            RelationKind::TermStatus => "term_status",
            RelationKind::TermOwner => "term_owner",
            RelationKind::TermSteward => "term_steward",
            RelationKind::TableLocation => "table_location",
            RelationKind::ColumnTable => "column_table",
            RelationKind::LinkTerm => "link_term",
            RelationKind::NoteRule => "note_rule",
        }
    }

    /// `(source, target)` node kinds.
    pub fn endpoints(self) -> (EntityKind, EntityKind) {
        use EntityKind as E;
        match self {
            RelationKind::TermCategory => (E::Term, E::Category),
            RelationKind::RuleTerm => (E::Rule, E::Term),
            RelationKind::ColumnTerm => (E::Column, E::Term),
            RelationKind::DocumentTerm => (E::Document, E::Term),
            RelationKind::DocumentRule => (E::Document, E::Rule),
            RelationKind::DocumentType => (E::Document, E::DocumentType),
            RelationKind::RelatedTerm => (E::Term, E::Term),
            RelationKind::TermStatus => (E::Term, E::TermStatus),
            RelationKind::TermOwner => (E::Term, E::Person),
            RelationKind::TermSteward => (E::Term, E::Person),
            RelationKind::TableLocation => (E::Table, E::Location),
            RelationKind::ColumnTable => (E::Column, E::Table),
            RelationKind::LinkTerm => (E::Link, E::Term),
            RelationKind::NoteRule => (E::Note, E::Rule),
        }
    }

    pub fn source_kind(self) -> EntityKind {
        self.endpoints().0
    }

    pub fn target_kind(self) -> EntityKind {
        self.endpoints().1
    }

    pub fn is_symmetric(self) -> bool {
        matches!(self, RelationKind::RelatedTerm)
    }

    pub fn is_functional(self) -> bool {
        matches!(
            self,
            RelationKind::TermStatus
                | RelationKind::TermOwner
                | RelationKind::TermSteward
                | RelationKind::TableLocation
                | RelationKind::ColumnTable
                | RelationKind::LinkTerm
                | RelationKind::NoteRule
        )
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("glossary"), None);
    }

    #[test]
    fn only_related_term_is_symmetric() {
        let symmetric: Vec<_> = RelationKind::ALL
            .into_iter()
            .filter(|r| r.is_symmetric())
            .collect();
        assert_eq!(symmetric, vec![RelationKind::RelatedTerm]);
        assert!(!RelationKind::RelatedTerm.is_functional());
    }

    #[test]
    fn symmetric_relations_have_matching_endpoints() {
        for rel in RelationKind::ALL.into_iter().filter(|r| r.is_symmetric()) {
            assert_eq!(rel.source_kind(), rel.target_kind());
        }
    }
}
