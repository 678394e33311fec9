//! Entity catalog: the declarative description of every record kind.
//!
//! The loader and the dumper are generic; everything kind-specific (which
//! field is the natural key, which fields reference other kinds, which section
//! a kind lives in) is read from the tables below. Adding a kind means adding
//! a `KindSpec` and a slot in `LOAD_ORDER`.
//!
//! ```text
//!   location ─► person ─► category ─► term_status ─► document_type
//!       │
//!       ▼
//!     terms ─► rules ─► tables ─► columns ─► documents ─► links
//!                                                          │
//!                                   notes ◄─ related_terms ◄┘
//! ```

use glossary_graph::{EntityKind, RelationKind};

// ============================================================================
// Spec types
// ============================================================================

/// How a text attribute is treated on dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStyle {
    /// Prose: word-wrapped to the configured width.
    Free,
    /// Emitted exactly as stored.
    Verbatim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub style: FieldStyle,
}

const fn free(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        style: FieldStyle::Free,
    }
}

const fn verbatim(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        style: FieldStyle::Verbatim,
    }
}

/// Natural key of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalKeySpec {
    /// Unique across the kind.
    Field(&'static str),
    /// Unique within the node reached through the `scope` reference field.
    Scoped {
        field: &'static str,
        scope: &'static str,
    },
}

impl NaturalKeySpec {
    pub fn field(&self) -> &'static str {
        match self {
            NaturalKeySpec::Field(field) | NaturalKeySpec::Scoped { field, .. } => field,
        }
    }

    pub fn scope(&self) -> Option<&'static str> {
        match self {
            NaturalKeySpec::Field(_) => None,
            NaturalKeySpec::Scoped { scope, .. } => Some(scope),
        }
    }
}

/// A record field holding natural keys of another kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSpec {
    pub field: &'static str,
    pub relation: RelationKind,
    /// A missing or dangling value is reported.
    pub required: bool,
    /// The field holds a list and maps to a many-to-many relation.
    pub many: bool,
    /// Optional sibling field naming the scope of a scoped target
    /// (a column's `location` picks between tables of the same name).
    pub qualifier: Option<&'static str>,
}

impl ReferenceSpec {
    pub fn target(&self) -> EntityKind {
        self.relation.target_kind()
    }
}

const fn one(field: &'static str, relation: RelationKind, required: bool) -> ReferenceSpec {
    ReferenceSpec {
        field,
        relation,
        required,
        many: false,
        qualifier: None,
    }
}

const fn many(field: &'static str, relation: RelationKind) -> ReferenceSpec {
    ReferenceSpec {
        field,
        relation,
        required: false,
        many: true,
        qualifier: None,
    }
}

/// Everything the engine knows about one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSpec {
    pub kind: EntityKind,
    /// Section name in dataset files.
    pub section: &'static str,
    pub key: NaturalKeySpec,
    /// Attribute fields, in dump order. The key field is one of them.
    pub fields: &'static [FieldSpec],
    pub references: &'static [ReferenceSpec],
    /// Stub nodes of this kind may be created for dangling references
    /// unless configuration says otherwise.
    pub auto_create: bool,
}

impl KindSpec {
    pub fn reference(&self, field: &str) -> Option<&'static ReferenceSpec> {
        self.references.iter().find(|r| r.field == field)
    }

    /// The reference that scopes this kind's natural key.
    pub fn scope_reference(&self) -> Option<&'static ReferenceSpec> {
        self.key.scope().and_then(|scope| self.reference(scope))
    }

    pub fn is_scoped(&self) -> bool {
        self.key.scope().is_some()
    }

    /// Whether `field` means anything for this kind.
    pub fn knows_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.name == field)
            || self
                .references
                .iter()
                .any(|r| r.field == field || r.qualifier == Some(field))
    }

    /// Whether the kind takes part in a symmetric relation.
    pub fn is_symmetric(&self) -> bool {
        RelationKind::ALL
            .iter()
            .any(|r| r.is_symmetric() && r.source_kind() == self.kind)
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub const KINDS: [KindSpec; 12] = [
    KindSpec {
        kind: EntityKind::Location,
        section: "location",
        key: NaturalKeySpec::Field("name"),
        fields: &[
            verbatim("name"),
            verbatim("host"),
            free("description"),
            verbatim("path"),
            free("notes"),
        ],
        references: &[],
        auto_create: false,
    },
    KindSpec {
        kind: EntityKind::Person,
        section: "person",
        key: NaturalKeySpec::Field("name"),
        fields: &[verbatim("name")],
        references: &[],
        auto_create: false,
    },
    KindSpec {
        kind: EntityKind::Category,
        section: "category",
        key: NaturalKeySpec::Field("name"),
        fields: &[verbatim("name"), free("description")],
        references: &[],
        auto_create: true,
    },
    KindSpec {
        kind: EntityKind::TermStatus,
        section: "term_status",
        key: NaturalKeySpec::Field("status"),
        fields: &[verbatim("status")],
        references: &[],
        auto_create: false,
    },
    KindSpec {
        kind: EntityKind::DocumentType,
        section: "document_type",
        key: NaturalKeySpec::Field("type"),
        fields: &[verbatim("type")],
        references: &[],
        auto_create: true,
    },
    KindSpec {
        kind: EntityKind::Term,
        section: "terms",
        key: NaturalKeySpec::Field("name"),
        fields: &[
            verbatim("name"),
            free("short_description"),
            free("long_description"),
            verbatim("abbreviation"),
        ],
        references: &[
            one("status", RelationKind::TermStatus, true),
            one("owner", RelationKind::TermOwner, true),
            one("steward", RelationKind::TermSteward, false),
            many("categories", RelationKind::TermCategory),
        ],
        auto_create: false,
    },
    KindSpec {
        kind: EntityKind::Rule,
        section: "rules",
        key: NaturalKeySpec::Field("name"),
        fields: &[
            verbatim("identifier"),
            verbatim("name"),
            free("description"),
            free("notes"),
        ],
        references: &[many("terms", RelationKind::RuleTerm)],
        auto_create: false,
    },
    KindSpec {
        kind: EntityKind::Table,
        section: "tables",
        key: NaturalKeySpec::Scoped {
            field: "name",
            scope: "location",
        },
        fields: &[verbatim("name"), free("description")],
        references: &[one("location", RelationKind::TableLocation, true)],
        auto_create: false,
    },
    KindSpec {
        kind: EntityKind::Column,
        section: "columns",
        key: NaturalKeySpec::Scoped {
            field: "name",
            scope: "table",
        },
        fields: &[
            verbatim("name"),
            free("description"),
            verbatim("type"),
            verbatim("length"),
            verbatim("format"),
        ],
        references: &[
            ReferenceSpec {
                field: "table",
                relation: RelationKind::ColumnTable,
                required: true,
                many: false,
                qualifier: Some("location"),
            },
            many("terms", RelationKind::ColumnTerm),
        ],
        auto_create: false,
    },
    KindSpec {
        kind: EntityKind::Document,
        section: "documents",
        key: NaturalKeySpec::Field("name"),
        fields: &[verbatim("name"), verbatim("path"), free("description")],
        references: &[
            many("types", RelationKind::DocumentType),
            many("terms", RelationKind::DocumentTerm),
            many("rules", RelationKind::DocumentRule),
        ],
        auto_create: false,
    },
    KindSpec {
        kind: EntityKind::Link,
        section: "links",
        key: NaturalKeySpec::Field("text"),
        fields: &[verbatim("text"), verbatim("address")],
        references: &[one("term", RelationKind::LinkTerm, true)],
        auto_create: false,
    },
    // A note has no name of its own: the owning rule plus the note text
    // identify it, so the text must stay verbatim.
    KindSpec {
        kind: EntityKind::Note,
        section: "notes",
        key: NaturalKeySpec::Scoped {
            field: "note",
            scope: "rule",
        },
        fields: &[verbatim("note_type"), verbatim("note")],
        references: &[one("rule", RelationKind::NoteRule, true)],
        auto_create: false,
    },
];

/// A section of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Nodes(EntityKind),
    /// `{term, related_terms[]}` records driving the symmetric reconciler.
    RelatedTerms,
}

pub const RELATED_TERMS_SECTION: &str = "related_terms";
pub const RELATED_TERMS_FIELD: &str = "related_terms";

/// Processing order for loading, and emission order for dumping.
pub const LOAD_ORDER: [Section; 13] = [
    Section::Nodes(EntityKind::Location),
    Section::Nodes(EntityKind::Person),
    Section::Nodes(EntityKind::Category),
    Section::Nodes(EntityKind::TermStatus),
    Section::Nodes(EntityKind::DocumentType),
    Section::Nodes(EntityKind::Term),
    Section::Nodes(EntityKind::Rule),
    Section::Nodes(EntityKind::Table),
    Section::Nodes(EntityKind::Column),
    Section::Nodes(EntityKind::Document),
    Section::Nodes(EntityKind::Link),
    Section::RelatedTerms,
    Section::Nodes(EntityKind::Note),
];

impl Section {
    pub fn name(self) -> &'static str {
        match self {
            Section::Nodes(kind) => spec(kind).section,
            Section::RelatedTerms => RELATED_TERMS_SECTION,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        LOAD_ORDER.into_iter().find(|s| s.name() == name)
    }
}

pub fn spec(kind: EntityKind) -> &'static KindSpec {
    // KINDS is declared in `EntityKind::ALL` order.
    &KINDS[kind as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_enum_order() {
        for kind in EntityKind::ALL {
            assert_eq!(spec(kind).kind, kind);
        }
    }

    #[test]
    fn every_kind_has_one_section() {
        for kind in EntityKind::ALL {
            let section = Section::Nodes(kind);
            assert_eq!(Section::from_name(section.name()), Some(section));
            assert_eq!(
                LOAD_ORDER.iter().filter(|s| **s == section).count(),
                1,
                "{kind}"
            );
        }
        assert_eq!(
            Section::from_name("related_terms"),
            Some(Section::RelatedTerms)
        );
    }

    #[test]
    fn references_are_loaded_before_referrers() {
        let position = |section: Section| LOAD_ORDER.iter().position(|s| *s == section);
        for kind in EntityKind::ALL {
            let here = position(Section::Nodes(kind));
            for reference in spec(kind).references {
                let target = reference.target();
                // Term ↔ Term goes through its own section.
                if target == kind {
                    continue;
                }
                assert!(
                    position(Section::Nodes(target)) < here,
                    "{kind}.{} points forward to {target}",
                    reference.field
                );
            }
        }
        assert!(position(Section::RelatedTerms) > position(Section::Nodes(EntityKind::Term)));
    }

    #[test]
    fn key_fields_are_verbatim_attributes() {
        for spec in KINDS {
            let key = spec.key.field();
            let field = spec.fields.iter().find(|f| f.name == key);
            assert_eq!(
                field.map(|f| f.style),
                Some(FieldStyle::Verbatim),
                "{}",
                spec.kind
            );
            if let Some(scope) = spec.key.scope() {
                let reference = spec.scope_reference();
                assert!(reference.is_some_and(|r| !r.many), "{scope}");
            }
        }
    }

    #[test]
    fn only_terms_are_symmetric() {
        let symmetric: Vec<_> = KINDS
            .iter()
            .filter(|s| s.is_symmetric())
            .map(|s| s.kind)
            .collect();
        assert_eq!(symmetric, vec![EntityKind::Term]);
    }

    #[test]
    fn column_location_is_a_known_field() {
        let columns = spec(EntityKind::Column);
        assert!(columns.knows_field("location"));
        assert!(columns.knows_field("terms"));
        assert!(!columns.knows_field("owner"));
    }
}
