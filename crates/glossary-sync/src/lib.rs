//! Glossary Sync: bulk load, reconcile and dump
//!
//! Moves a glossary between a flat, human-editable dataset file and the
//! graph store, in both directions.
//!
//! ```text
//!   dataset.yaml ──► record ──► Loader ──┬─► resolver (natural key → NodeId)
//!                                        ├─► reconcile (edges, stubs, A↔B)
//!                                        └─► GraphStore
//!
//!   GraphStore ──► dump (catalog order) ──► format (wrap, scalar style) ──► dataset.yaml
//! ```
//!
//! Everything kind-specific comes from [`catalog`]; the loader and dumper
//! are generic over it.
//!
//! ## Guarantees
//!
//! - **Re-runnable**: loading the same file twice creates nothing the second
//!   time; existing nodes win over colliding records.
//! - **Round trip**: a dump is a valid load input and rebuilds the same
//!   nodes and edges.
//! - **Mirrored related terms**: A relates to B exactly when B relates to A.
//! - **Record-level failure**: a store error undoes one record and becomes a
//!   warning; only malformed input and file errors fail a call.

pub mod catalog;
pub mod config;
pub mod dump;
pub mod error;
pub mod export;
pub mod format;
pub mod loader;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod resolver;

pub use catalog::{KindSpec, Section, LOAD_ORDER};
pub use config::SyncConfig;
pub use dump::{dump_document, dump_path, dump_string, DumpSummary};
pub use error::SyncError;
pub use export::{column_associations, export_columns_path, export_terms_path, term_exports};
pub use loader::{load_path, load_str, Loader};
pub use reconcile::{related_diff, EdgeReconciler, RelatedDiff};
pub use record::{Dataset, Record};
pub use report::{KindCounts, LoadEvent, LoadReport};
pub use resolver::{KeyResolver, NaturalKey};
