//! Read-only exports for downstream tools.
//!
//! - a CSV of which column carries which term (`term,table,column`)
//! - a JSON document with one object per term and everything hanging off it

use crate::dump::write_atomic;
use crate::error::Result;
use crate::resolver::name_of;
use chrono::{DateTime, Utc};
use glossary_graph::{EntityKind, GraphStore, NodeId, RelationKind};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

// ============================================================================
// Column associations (CSV)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ColumnAssociation {
    pub term: String,
    /// `location.table`, or the bare table name when it has no location.
    pub table: String,
    pub column: String,
}

/// One row per term–column edge, ordered by term, table, column.
pub fn column_associations<S: GraphStore + ?Sized>(store: &S) -> Vec<ColumnAssociation> {
    let mut rows = Vec::new();
    for column in store.nodes_of_kind(EntityKind::Column) {
        let Some(column_name) = name_of(store, column) else {
            continue;
        };
        let table = store
            .target(column, RelationKind::ColumnTable)
            .map(|table| qualified_table(store, table))
            .unwrap_or_default();
        for term in store.targets(column, RelationKind::ColumnTerm) {
            if let Some(term) = name_of(store, term) {
                rows.push(ColumnAssociation {
                    term,
                    table: table.clone(),
                    column: column_name.clone(),
                });
            }
        }
    }
    rows.sort();
    rows
}

fn qualified_table<S: GraphStore + ?Sized>(store: &S, table: NodeId) -> String {
    let name = name_of(store, table).unwrap_or_default();
    match store
        .target(table, RelationKind::TableLocation)
        .and_then(|location| name_of(store, location))
    {
        Some(location) => format!("{location}.{name}"),
        None => name,
    }
}

/// Write the associations as CSV with a header row. Returns the row count.
pub fn write_column_csv<S: GraphStore + ?Sized, W: Write>(store: &S, out: W) -> Result<usize> {
    let rows = column_associations(store);
    let mut writer = csv::Writer::from_writer(out);
    for row in &rows {
        writer.serialize(row)?;
    }
    if rows.is_empty() {
        writer.write_record(["term", "table", "column"])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(rows.len())
}

pub fn export_columns_path<S: GraphStore + ?Sized>(store: &S, path: &Path) -> Result<usize> {
    let mut buf = Vec::new();
    let rows = write_column_csv(store, &mut buf)?;
    write_atomic(path, &buf)?;
    tracing::info!(path = %path.display(), rows, "exported column associations");
    Ok(rows)
}

// ============================================================================
// Terms (JSON)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermExport {
    pub name: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub abbreviation: Option<String>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub steward: Option<String>,
    pub categories: Vec<CategoryExport>,
    pub links: Vec<LinkExport>,
    pub columns: Vec<ColumnExport>,
    pub rules: Vec<RuleExport>,
    pub related_terms: Vec<String>,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryExport {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkExport {
    pub text: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnExport {
    pub name: String,
    pub table: String,
    #[serde(rename = "type")]
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleExport {
    pub identifier: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub notes: Option<String>,
}

fn attr<S: GraphStore + ?Sized>(store: &S, id: NodeId, field: &str) -> Option<String> {
    store.node(id)?.attr(field).map(str::to_string)
}

/// Every term, in creation order.
pub fn term_exports<S: GraphStore + ?Sized>(store: &S) -> Vec<TermExport> {
    store
        .nodes_of_kind(EntityKind::Term)
        .into_iter()
        .filter_map(|id| term_export(store, id))
        .collect()
}

fn term_export<S: GraphStore + ?Sized>(store: &S, id: NodeId) -> Option<TermExport> {
    let node = store.node(id)?;
    let single = |relation| store.target(id, relation).and_then(|t| name_of(store, t));

    let categories = store
        .targets(id, RelationKind::TermCategory)
        .into_iter()
        .filter_map(|c| {
            Some(CategoryExport {
                name: name_of(store, c)?,
                description: attr(store, c, "description"),
            })
        })
        .collect();

    let links = store
        .sources(id, RelationKind::LinkTerm)
        .into_iter()
        .filter_map(|l| {
            Some(LinkExport {
                text: name_of(store, l)?,
                address: attr(store, l, "address"),
            })
        })
        .collect();

    let columns = store
        .sources(id, RelationKind::ColumnTerm)
        .into_iter()
        .filter_map(|c| {
            Some(ColumnExport {
                name: name_of(store, c)?,
                table: store
                    .target(c, RelationKind::ColumnTable)
                    .map(|t| qualified_table(store, t))
                    .unwrap_or_default(),
                data_type: attr(store, c, "type"),
            })
        })
        .collect();

    let rules = store
        .sources(id, RelationKind::RuleTerm)
        .into_iter()
        .filter_map(|r| {
            Some(RuleExport {
                identifier: attr(store, r, "identifier"),
                name: name_of(store, r)?,
                description: attr(store, r, "description"),
                notes: attr(store, r, "notes"),
            })
        })
        .collect();

    let mut related: Vec<String> = store
        .targets(id, RelationKind::RelatedTerm)
        .into_iter()
        .filter_map(|t| name_of(store, t))
        .collect();
    related.sort();

    Some(TermExport {
        name: node.attr("name")?.to_string(),
        short_description: attr(store, id, "short_description"),
        long_description: attr(store, id, "long_description"),
        abbreviation: attr(store, id, "abbreviation"),
        status: single(RelationKind::TermStatus),
        owner: single(RelationKind::TermOwner),
        steward: single(RelationKind::TermSteward),
        categories,
        links,
        columns,
        rules,
        related_terms: related,
        created_on: node.created_on,
        updated_on: node.updated_on,
    })
}

/// Pretty JSON array of `terms`.
pub fn terms_json(terms: &[TermExport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(terms)?)
}

pub fn export_terms_path<S: GraphStore + ?Sized>(store: &S, path: &Path) -> Result<usize> {
    let terms = term_exports(store);
    let json = terms_json(&terms)?;
    write_atomic(path, json.as_bytes())?;
    tracing::info!(path = %path.display(), terms = terms.len(), "exported terms");
    Ok(terms.len())
}
