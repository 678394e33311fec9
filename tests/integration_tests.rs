//! Integration tests across the graph store and the sync engine
//!
//! These tests exercise the pieces together, the way the CLI strings them:
//! - dataset → Loader → MemoryStore → snapshot file → reopen → load again
//! - MemoryStore → dump → fresh store → identical graph
//! - document removal hook → dump without the document
//!
//! Run with: cargo test --test integration_tests

use glossary_graph::{DocumentHook, EntityKind, GraphStore, MemoryStore, Node, RelationKind};
use glossary_sync::{
    column_associations, dump_path, dump_string, export_columns_path, export_terms_path, load_path,
    load_str, term_exports, SyncConfig,
};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

const DATASET: &str = r#"
location:
- name: dwh
- name: lake
person:
- name: Jane
- name: Omar
term_status:
- status: Approved
terms:
- name: Customer
  short_description: Someone who buys from us
  status: Approved
  owner: Jane
  steward: Omar
  categories: [Sales, Master data]
- name: Order
  status: Approved
  owner: Jane
- name: Invoice
  status: Approved
  owner: Omar
rules:
- identifier: R-7
  name: Orders need a customer
  terms: [Order, Customer]
tables:
- name: customers
  location: dwh
- name: customers
  location: lake
columns:
- name: cust_id
  table: customers
  location: dwh
  terms: [Customer]
- name: cust_id
  table: customers
  location: lake
  terms: [Customer]
documents:
- name: Data policy
  path: policy.pdf
  types: [Policy]
  terms: [Customer]
  rules: [Orders need a customer]
related_terms:
- term: Customer
  related_terms: [Order]
- term: Order
  related_terms: [Customer, Invoice]
"#;

fn find(store: &MemoryStore, kind: EntityKind, name: &str) -> glossary_graph::NodeId {
    store
        .nodes_of_kind(kind)
        .into_iter()
        .find(|id| store.node(*id).and_then(|n| n.attr("name")) == Some(name))
        .unwrap_or_else(|| panic!("no {kind} named {name}"))
}

fn shape(store: &MemoryStore) -> Vec<(String, usize)> {
    let nodes = EntityKind::ALL
        .iter()
        .map(|k| (k.as_str().to_string(), store.node_count(*k)));
    let edges = RelationKind::ALL
        .iter()
        .map(|r| (r.as_str().to_string(), store.edge_count(*r)));
    nodes.chain(edges).collect()
}

// ============================================================================
// Snapshot persistence
// ============================================================================

#[test]
fn test_reload_after_snapshot_is_idempotent() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("glossary.gldb");
    let config = SyncConfig::default();

    let mut store = MemoryStore::open_or_new(&db).unwrap();
    let first = load_str(&mut store, DATASET, &config).unwrap();
    assert_eq!(first.total_store_errors(), 0);
    assert!(
        first.warnings.iter().all(|w| w.message.starts_with("created stub")),
        "{:?}",
        first.warnings
    );
    assert_eq!(first.counts(EntityKind::Category).stub_created, 2);
    store.save(&db).unwrap();
    let before = shape(&store);

    let mut reopened = MemoryStore::open(&db).unwrap();
    assert_eq!(shape(&reopened), before);

    let second = load_str(&mut reopened, DATASET, &config).unwrap();
    assert_eq!(second.total_created(), 0);
    assert_eq!(second.counts(EntityKind::Table).duplicate_skipped, 2);
    assert_eq!(shape(&reopened), before);
}

#[test]
fn test_scoped_tables_survive_snapshot() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("glossary.gldb");

    let mut store = MemoryStore::new();
    load_str(&mut store, DATASET, &SyncConfig::default()).unwrap();
    store.save(&db).unwrap();
    let store = MemoryStore::open(&db).unwrap();

    assert_eq!(store.node_count(EntityKind::Table), 2);
    assert_eq!(store.node_count(EntityKind::Column), 2);

    let mut locations: Vec<String> = store
        .nodes_of_kind(EntityKind::Column)
        .into_iter()
        .filter_map(|c| store.target(c, RelationKind::ColumnTable))
        .filter_map(|t| store.target(t, RelationKind::TableLocation))
        .filter_map(|l| store.node(l).and_then(|n| n.attr("name")).map(str::to_string))
        .collect();
    locations.sort();
    assert_eq!(locations, ["dwh", "lake"]);
}

// ============================================================================
// Dump round trip
// ============================================================================

#[test]
fn test_dump_file_rebuilds_same_graph() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("dump.yaml");
    let config = SyncConfig::default();

    let mut store = MemoryStore::new();
    load_str(&mut store, DATASET, &config).unwrap();
    let summary = dump_path(&store, &out, &config).unwrap();
    assert_eq!(summary.sections.get("tables"), Some(&2));
    assert_eq!(summary.sections.get("related_terms"), Some(&3));

    let mut copy = MemoryStore::new();
    let report = load_path(&mut copy, &out, &config).unwrap();
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(shape(&copy), shape(&store));
    assert_eq!(dump_string(&copy, &config), dump_string(&store, &config));
}

#[test]
fn test_related_terms_are_mirrored_after_load() {
    let mut store = MemoryStore::new();
    load_str(&mut store, DATASET, &SyncConfig::default()).unwrap();

    let customer = find(&store, EntityKind::Term, "Customer");
    let order = find(&store, EntityKind::Term, "Order");
    let invoice = find(&store, EntityKind::Term, "Invoice");

    assert_eq!(store.targets(order, RelationKind::RelatedTerm).len(), 2);
    for (a, b) in [(customer, order), (order, invoice)] {
        assert!(store.has_edge(a, RelationKind::RelatedTerm, b));
        assert!(store.has_edge(b, RelationKind::RelatedTerm, a));
    }
    assert!(!store.has_edge(customer, RelationKind::RelatedTerm, invoice));
}

#[test]
fn test_later_file_reconciles_related_terms() {
    let mut store = MemoryStore::new();
    let config = SyncConfig::default();
    load_str(&mut store, DATASET, &config).unwrap();

    let update = "related_terms:\n- term: Order\n  related_terms: [Invoice]\n";
    let report = load_str(&mut store, update, &config).unwrap();

    let customer = find(&store, EntityKind::Term, "Customer");
    let order = find(&store, EntityKind::Term, "Order");
    assert!(!store.has_edge(customer, RelationKind::RelatedTerm, order));
    assert!(!store.has_edge(order, RelationKind::RelatedTerm, customer));
    assert_eq!(report.edge_counts(RelationKind::RelatedTerm).removed, 2);
    assert_eq!(report.edge_counts(RelationKind::RelatedTerm).added, 0);
}

// ============================================================================
// Document removal
// ============================================================================

struct RemovedFiles(Arc<Mutex<Vec<String>>>);

impl DocumentHook for RemovedFiles {
    fn document_removed(&self, document: &Node) {
        if let Some(path) = document.attr("path") {
            self.0.lock().unwrap().push(path.to_string());
        }
    }
}

#[test]
fn test_removed_document_disappears_from_dump() {
    let config = SyncConfig::default();
    let removed = Arc::new(Mutex::new(Vec::new()));

    let mut store = MemoryStore::new();
    store.set_document_hook(Box::new(RemovedFiles(removed.clone())));
    load_str(&mut store, DATASET, &config).unwrap();

    let document = find(&store, EntityKind::Document, "Data policy");
    store.remove_document(document).unwrap();

    assert_eq!(*removed.lock().unwrap(), ["policy.pdf"]);
    assert_eq!(store.edge_count(RelationKind::DocumentTerm), 0);
    assert_eq!(store.edge_count(RelationKind::DocumentRule), 0);
    assert_eq!(store.edge_count(RelationKind::DocumentType), 0);

    let text = dump_string(&store, &config);
    assert!(!text.contains("documents:"));
    assert!(text.contains("\ndocument_type:\n"));
}

// ============================================================================
// Exports
// ============================================================================

#[test]
fn test_exports_after_snapshot_reload() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("glossary.gldb");
    let csv = dir.path().join("columns.csv");
    let json = dir.path().join("terms.json");

    let mut store = MemoryStore::new();
    load_str(&mut store, DATASET, &SyncConfig::default()).unwrap();
    store.save(&db).unwrap();
    let store = MemoryStore::open(&db).unwrap();

    assert_eq!(column_associations(&store).len(), 2);
    assert_eq!(export_columns_path(&store, &csv).unwrap(), 2);
    assert_eq!(
        std::fs::read_to_string(&csv).unwrap(),
        "term,table,column\nCustomer,dwh.customers,cust_id\nCustomer,lake.customers,cust_id\n"
    );

    assert_eq!(export_terms_path(&store, &json).unwrap(), 3);
    let terms: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(terms[0]["name"], "Customer");
    assert_eq!(terms[0]["steward"], "Omar");
    assert_eq!(terms[0]["rules"][0]["identifier"], "R-7");

    let customer = &term_exports(&store)[0];
    let mut categories: Vec<&str> = customer.categories.iter().map(|c| c.name.as_str()).collect();
    categories.sort();
    assert_eq!(categories, ["Master data", "Sales"]);
}
