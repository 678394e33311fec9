//! Dumper: serializes the graph back into dataset form.
//!
//! The output is a valid loader input. It walks sections in load order,
//! nodes in creation order, and writes references as natural keys. Given the
//! same graph and config it produces the same bytes.

use crate::catalog::{self, FieldStyle, KindSpec, Section, RELATED_TERMS_FIELD};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::format::{wrap_text, YamlWriter};
use crate::resolver::name_of;
use glossary_graph::{EntityKind, GraphStore, NodeId, RelationKind};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// What a dump wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DumpSummary {
    /// Records per emitted section.
    pub sections: BTreeMap<String, usize>,
    pub bytes: usize,
    /// Hex SHA-256 of the emitted text.
    pub sha256: String,
}

impl DumpSummary {
    pub fn records(&self) -> usize {
        self.sections.values().sum()
    }
}

/// Render the graph as dataset text.
pub fn dump_string<S: GraphStore + ?Sized>(store: &S, config: &SyncConfig) -> String {
    render(store, config).0
}

/// Render the graph and summarize the result.
pub fn dump_document<S: GraphStore + ?Sized>(
    store: &S,
    config: &SyncConfig,
) -> (String, DumpSummary) {
    let (text, sections) = render(store, config);
    let summary = DumpSummary {
        sections,
        bytes: text.len(),
        sha256: format!("{:x}", Sha256::digest(text.as_bytes())),
    };
    (text, summary)
}

/// Write the graph to `path`. The file is replaced only once the whole dump
/// has been written.
pub fn dump_path<S: GraphStore + ?Sized>(
    store: &S,
    path: &Path,
    config: &SyncConfig,
) -> Result<DumpSummary> {
    let (text, summary) = dump_document(store, config);
    write_atomic(path, text.as_bytes())?;
    tracing::info!(
        path = %path.display(),
        records = summary.records(),
        sha256 = %summary.sha256,
        "dumped dataset"
    );
    Ok(summary)
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    let written = std::fs::write(&tmp, bytes).and_then(|()| std::fs::rename(&tmp, path));
    written.map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        SyncError::FileWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

// ============================================================================
// Rendering
// ============================================================================

fn render<S: GraphStore + ?Sized>(
    store: &S,
    config: &SyncConfig,
) -> (String, BTreeMap<String, usize>) {
    let mut writer = YamlWriter::new();
    let mut sections = BTreeMap::new();

    for section in catalog::LOAD_ORDER {
        let count = match section {
            Section::Nodes(kind) => write_kind(store, config, catalog::spec(kind), &mut writer),
            Section::RelatedTerms => write_related(store, config, &mut writer),
        };
        if count > 0 {
            tracing::debug!(section = section.name(), records = count, "dumped section");
            sections.insert(section.name().to_string(), count);
        }
    }
    (writer.finish(), sections)
}

fn write_kind<S: GraphStore + ?Sized>(
    store: &S,
    config: &SyncConfig,
    spec: &KindSpec,
    writer: &mut YamlWriter,
) -> usize {
    let nodes = store.nodes_of_kind(spec.kind);
    if nodes.is_empty() {
        return 0;
    }
    writer.section(spec.section);

    for &id in &nodes {
        let Some(node) = store.node(id) else {
            continue;
        };
        writer.begin_item();

        for field in spec.fields {
            let Some(value) = node.attr(field.name) else {
                continue;
            };
            match field.style {
                FieldStyle::Free => writer.scalar(field.name, &wrap_text(value, config.wrap_width)),
                FieldStyle::Verbatim => writer.scalar(field.name, value),
            }
        }

        for reference in spec.references {
            if reference.many {
                let names = sorted_names(store, store.targets(id, reference.relation));
                write_list(writer, config, reference.field, &names);
                continue;
            }
            let Some(target) = store.target(id, reference.relation) else {
                continue;
            };
            if let Some(name) = name_of(store, target) {
                writer.scalar(reference.field, &name);
            }
            if let Some(qualifier) = reference.qualifier {
                if let Some(scope) = scope_name(store, target) {
                    writer.scalar(qualifier, &scope);
                }
            }
        }
    }
    writer.end_item();
    nodes.len()
}

/// One `{term, related_terms}` record per term, so that reloading a dump
/// restores each term's related set exactly.
fn write_related<S: GraphStore + ?Sized>(
    store: &S,
    config: &SyncConfig,
    writer: &mut YamlWriter,
) -> usize {
    let terms = store.nodes_of_kind(EntityKind::Term);
    if terms.is_empty() {
        return 0;
    }
    writer.section(Section::RelatedTerms.name());

    for &term in &terms {
        let Some(name) = name_of(store, term) else {
            continue;
        };
        writer.begin_item();
        writer.scalar("term", &name);

        let mut related = store.targets(term, RelationKind::RelatedTerm);
        related.extend(store.sources(term, RelationKind::RelatedTerm));
        related.retain(|other| *other != term);
        let names = sorted_names(store, related);
        write_list(writer, config, RELATED_TERMS_FIELD, &names);
    }
    writer.end_item();
    terms.len()
}

fn write_list(writer: &mut YamlWriter, config: &SyncConfig, field: &str, names: &[String]) {
    if !names.is_empty() {
        writer.list(field, names);
    } else if config.empty_markers {
        writer.comment(&format!("no {field}"));
    } else {
        writer.empty_list(field);
    }
}

fn sorted_names<S: GraphStore + ?Sized>(store: &S, ids: Vec<NodeId>) -> Vec<String> {
    let mut names: Vec<String> = ids.into_iter().filter_map(|id| name_of(store, id)).collect();
    names.sort();
    names.dedup();
    names
}

/// Name of the node scoping `id`'s natural key, if its kind is scoped.
fn scope_name<S: GraphStore + ?Sized>(store: &S, id: NodeId) -> Option<String> {
    let node = store.node(id)?;
    let scope_ref = catalog::spec(node.kind).scope_reference()?;
    let scope = store.target(id, scope_ref.relation)?;
    name_of(store, scope)
}
