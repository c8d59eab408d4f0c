//! Directory scans for library sources, test sources and test executables.
//!
//! All scans are non-recursive and return entries sorted by file name so
//! build and run order never depends on directory iteration order.

use std::path::{Path, PathBuf};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};

/// One compilable library source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,

    /// File stem, used to name the object artifact.
    pub stem: String,
}

/// A test program source, e.g. `tests/test_tree.c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSource {
    pub name: String,
    pub path: PathBuf,
}

/// A compiled test and where its reference snapshot lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub executable: PathBuf,
    pub snapshot: PathBuf,
}

impl TestCase {
    /// Test case for the executable `name` in the configured test directory.
    pub fn new(config: &HarnessConfig, name: &str) -> Self {
        let dir = config.test_dir();
        Self {
            name: name.to_string(),
            executable: dir.join(name),
            snapshot: dir.join(format!("{name}{}", config.layout.snapshot_suffix)),
        }
    }
}

impl TestSource {
    /// Executable path the test builder writes for this source.
    pub fn executable_path(&self, config: &HarnessConfig) -> PathBuf {
        config.test_dir().join(&self.name)
    }
}

/// Library sources: `<source_dir>/*.<ext>`.
///
/// A missing or empty source directory is a configuration error.
pub fn discover_sources(config: &HarnessConfig) -> Result<Vec<SourceUnit>> {
    let dir = config.source_dir();
    if !dir.is_dir() {
        return Err(HarnessError::Config(format!(
            "source directory {} does not exist",
            dir.display()
        )));
    }

    let sources: Vec<SourceUnit> = sorted_files(&dir)?
        .into_iter()
        .filter(|p| has_extension(p, &config.layout.source_extension))
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            Some(SourceUnit { path, stem })
        })
        .collect();

    if sources.is_empty() {
        return Err(HarnessError::Config(format!(
            "no *.{} sources found in {}",
            config.layout.source_extension,
            dir.display()
        )));
    }
    Ok(sources)
}

/// Test sources: `<test_dir>/<prefix>*.<ext>`.
pub fn discover_test_sources(config: &HarnessConfig) -> Result<Vec<TestSource>> {
    let dir = config.test_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    Ok(sorted_files(&dir)?
        .into_iter()
        .filter(|p| has_extension(p, &config.layout.source_extension))
        .filter_map(|path| {
            let name = path.file_stem()?.to_str()?.to_string();
            name.starts_with(&config.layout.test_prefix)
                .then_some(TestSource { name, path })
        })
        .collect())
}

/// Compiled test executables: `<test_dir>/<prefix>*` without any extension.
///
/// Files carrying an extension (sources, snapshots) are skipped.
pub fn discover_test_executables(config: &HarnessConfig) -> Result<Vec<TestCase>> {
    let dir = config.test_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    Ok(sorted_files(&dir)?
        .into_iter()
        .filter(|p| p.extension().is_none())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            name.starts_with(&config.layout.test_prefix)
                .then(|| TestCase::new(config, &name))
        })
        .collect())
}

/// Regular files directly inside `dir`, sorted by file name.
fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}
