//! Binary snapshots of a `MemoryStore` (`.gldb`).
//!
//! Layout: `b"GLDB"`, `u32` little-endian format version, `u64` payload
//! length, then the bincode-encoded `(NodeStore, EdgeStore)` pair.

use crate::edges::EdgeStore;
use crate::memory::MemoryStore;
use crate::nodes::NodeStore;
use crate::StoreError;
use std::fs;
use std::path::Path;

pub const SNAPSHOT_MAGIC: &[u8; 4] = b"GLDB";
pub const SNAPSHOT_VERSION: u32 = 1;

impl MemoryStore {
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let payload = bincode::serialize(&(&self.nodes, &self.edges))
            .map_err(|e| StoreError::Snapshot(e.to_string()))?;

        let mut out = Vec::with_capacity(16 + payload.len());
        out.extend_from_slice(SNAPSHOT_MAGIC);
        out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < 16 || &bytes[0..4] != SNAPSHOT_MAGIC {
            return Err(StoreError::Snapshot("missing GLDB header".to_string()));
        }

        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[4..8]);
        let version = u32::from_le_bytes(word);
        if version != SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "unsupported snapshot version {version}"
            )));
        }

        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[8..16]);
        let payload = usize::try_from(u64::from_le_bytes(len))
            .ok()
            .and_then(|len| 16usize.checked_add(len))
            .and_then(|end| bytes.get(16..end))
            .ok_or_else(|| StoreError::Snapshot("truncated payload".to_string()))?;

        let (nodes, edges): (NodeStore, EdgeStore) =
            bincode::deserialize(payload).map_err(|e| StoreError::Snapshot(e.to_string()))?;
        Ok(MemoryStore::from_parts(nodes, edges))
    }

    /// Read a snapshot file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Read a snapshot file, or start empty when it does not exist yet.
    pub fn open_or_new(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            Self::open(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Write a snapshot file. The bytes go to a sibling temp file first and
    /// are renamed into place.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = self.to_bytes()?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "saved snapshot");
        Ok(())
    }
}
