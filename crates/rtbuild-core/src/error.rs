//! Error taxonomy for the build and regression harness.

use std::path::PathBuf;

/// Errors produced while building or testing the library.
///
/// Regression mismatches are not errors: they surface as a `Failed`
/// verdict in the suite report and the remaining tests keep running.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compile failed for {} (exit code {exit_code:?}): {stderr}", .source_path.display())]
    Compile {
        source_path: PathBuf,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("archive input missing: {}", .0.display())]
    MissingObject(PathBuf),

    #[error("debug archive {} has not been built", .0.display())]
    MissingArchive(PathBuf),

    #[error("archiver failed for {} (exit code {exit_code:?}): {stderr}", .archive.display())]
    Archive {
        archive: PathBuf,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("test build failed for {test}: {reason}")]
    TestBuild { test: String, reason: String },

    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report: {0}")]
    Report(#[source] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HarnessError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
