//! Snapshot regression: run a test binary, compare its diagnostic output
//! against the stored reference.
//!
//! # Modules
//!
//! - [`normalize`] — `Normalizer`, masking of timestamp prefixes
//! - [`diff`]      — `LineDiff`, marked line diff for failed comparisons
//! - [`engine`]    — `SnapshotEngine`, the per-test state machine

pub mod diff;
pub mod engine;
pub mod normalize;

pub use diff::{DiffLine, DiffTag, LineDiff};
pub use engine::{compare, SnapshotEngine};
pub use normalize::Normalizer;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one test outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// No reference existed; the captured output became the reference.
    New,
    /// Normalized output matched the reference.
    Ok,
    /// Normalized output differed from the reference.
    Failed,
    /// The test binary was killed after exceeding its time limit.
    Timeout,
    /// The test program did not build and was skipped.
    BuildFailed,
}

impl Verdict {
    /// Text shown in the summary line.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::New => "NEW",
            Verdict::Ok => "ok",
            Verdict::Failed => "FAILED",
            Verdict::Timeout => "TIMEOUT",
            Verdict::BuildFailed => "BUILD FAILED",
        }
    }

    /// Whether this verdict should fail the suite.
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::Failed | Verdict::Timeout | Verdict::BuildFailed)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transient result of running one test case.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub name: String,
    pub verdict: Verdict,

    /// Raw diagnostic stream as captured.
    pub captured: Vec<u8>,

    /// Present when the verdict is `Failed`.
    pub diff: Option<LineDiff>,

    /// Extra detail for `Timeout` and `BuildFailed`.
    pub detail: Option<String>,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl RunResult {
    pub(crate) fn new(name: &str, verdict: Verdict) -> Self {
        Self {
            name: name.to_string(),
            verdict,
            captured: Vec::new(),
            diff: None,
            detail: None,
            duration_ms: 0,
        }
    }

    /// Result for a test skipped because its build failed.
    pub fn build_failed(name: &str, reason: &str) -> Self {
        Self {
            detail: Some(reason.to_string()),
            ..Self::new(name, Verdict::BuildFailed)
        }
    }
}
