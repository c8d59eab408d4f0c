//! Record of generated outputs.
//!
//! Each successful build step records what it wrote: object files,
//! archives (with their ordered member list) and test executables, each
//! with a SHA-256 content digest. `clean` deletes exactly the recorded
//! paths, so operator-owned files such as reference snapshots survive.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{HarnessError, Result};

const LEDGER_VERSION: u32 = 1;

/// What kind of artifact a ledger entry describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Object,
    Archive,
    TestExecutable,
}

/// One recorded output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputRecord {
    pub kind: OutputKind,

    /// Hex SHA-256 of the file contents when it was recorded.
    pub digest: String,

    /// Archive members in archive order (empty for other kinds).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

/// Persisted map from output path (relative to the project root) to record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputLedger {
    version: u32,
    outputs: BTreeMap<String, OutputRecord>,
}

impl Default for OutputLedger {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            outputs: BTreeMap::new(),
        }
    }
}

impl OutputLedger {
    /// Load the ledger at `path`; a missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| HarnessError::io(path, e))
    }

    /// Record `output`, digesting its current contents.
    pub fn record(
        &mut self,
        root: &Path,
        output: &Path,
        kind: OutputKind,
        members: &[PathBuf],
    ) -> Result<()> {
        let digest = file_digest(output)?;
        let members = members.iter().map(|m| relative_key(root, m)).collect();
        self.outputs.insert(
            relative_key(root, output),
            OutputRecord {
                kind,
                digest,
                members,
            },
        );
        Ok(())
    }

    /// Record for `output`, if any.
    pub fn get(&self, root: &Path, output: &Path) -> Option<&OutputRecord> {
        self.outputs.get(&relative_key(root, output))
    }

    /// All recorded outputs as absolute paths.
    pub fn paths(&self, root: &Path) -> Vec<PathBuf> {
        self.outputs.keys().map(|k| root.join(k)).collect()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Hex SHA-256 of a file's contents.
pub fn file_digest(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| HarnessError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OutputLedger::load(&dir.path().join("none.json")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_record_stores_relative_path_and_digest() {
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("tree.o");
        std::fs::write(&obj, b"object").unwrap();

        let mut ledger = OutputLedger::default();
        ledger
            .record(dir.path(), &obj, OutputKind::Object, &[])
            .unwrap();

        let record = ledger.get(dir.path(), &obj).unwrap();
        assert_eq!(record.kind, OutputKind::Object);
        assert_eq!(record.digest.len(), 64);
        assert_eq!(ledger.paths(dir.path()), vec![obj]);
    }

    #[test]
    fn test_archive_members_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("lib.a");
        std::fs::write(&archive, b"!<arch>\n").unwrap();
        let members = vec![dir.path().join("a.o"), dir.path().join("b.o")];

        let mut ledger = OutputLedger::default();
        ledger
            .record(dir.path(), &archive, OutputKind::Archive, &members)
            .unwrap();
        let path = dir.path().join("ledger.json");
        ledger.save(&path).unwrap();

        let loaded = OutputLedger::load(&path).unwrap();
        assert_eq!(
            loaded.get(dir.path(), &archive).unwrap().members,
            vec!["a.o", "b.o"]
        );
    }

    #[test]
    fn test_digest_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x");
        std::fs::write(&file, b"one").unwrap();
        let first = file_digest(&file).unwrap();
        std::fs::write(&file, b"two").unwrap();
        assert_ne!(first, file_digest(&file).unwrap());
    }
}
