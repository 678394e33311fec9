//! Engine configuration.

use crate::catalog;
use crate::error::{Result, SyncError};
use glossary_graph::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Knobs for loading and dumping.
///
/// ```yaml
/// auto_create: [category, document_type]
/// wrap_width: 100
/// empty_markers: true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Kinds that get a stub node when a reference to them does not resolve.
    /// Defaults to the kinds the catalog marks as stubbable.
    pub auto_create: BTreeSet<EntityKind>,
    /// Column at which free text is wrapped on dump.
    pub wrap_width: usize,
    /// Emit `# no <field>` for empty relation lists.
    pub empty_markers: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_create: catalog::KINDS
                .iter()
                .filter(|spec| spec.auto_create)
                .map(|spec| spec.kind)
                .collect(),
            wrap_width: 100,
            empty_markers: true,
        }
    }
}

impl SyncConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SyncError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: SyncConfig =
            serde_yaml::from_str(text).map_err(|e| SyncError::Config(e.to_string()))?;
        if config.wrap_width < 20 {
            return Err(SyncError::Config(format!(
                "wrap_width must be at least 20, got {}",
                config.wrap_width
            )));
        }
        Ok(config)
    }

    /// No stubs at all.
    pub fn without_auto_create(mut self) -> Self {
        self.auto_create.clear();
        self
    }

    pub fn allows_stub(&self, kind: EntityKind) -> bool {
        self.auto_create.contains(&kind)
    }
}
