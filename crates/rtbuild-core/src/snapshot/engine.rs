//! Per-test snapshot state machine.
//!
//! Run the binary, capture stderr, then either bootstrap the reference
//! (`New`) or compare normalized lines against it (`Ok` / `Failed`).
//! Standard output and the exit status play no part in the verdict. A
//! crashed binary is judged on whatever it wrote before dying; one that
//! cannot be started at all is `Failed` without touching its reference.

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::diff::LineDiff;
use super::normalize::Normalizer;
use super::{RunResult, Verdict};
use crate::command::CommandLine;
use crate::discovery::TestCase;
use crate::error::{HarnessError, Result};
use crate::process::CommandRunner;

/// Compare a reference snapshot with freshly captured output.
///
/// Returns `None` when the normalized line sequences are equal and the
/// marked diff of the normalized lines otherwise.
pub fn compare(normalizer: &Normalizer, reference: &[u8], captured: &[u8]) -> Option<LineDiff> {
    let expected = normalizer.normalize_lines(reference);
    let actual = normalizer.normalize_lines(captured);
    if expected == actual {
        None
    } else {
        Some(LineDiff::compute(&expected, &actual))
    }
}

/// Executes test cases and classifies their output.
pub struct SnapshotEngine<'a> {
    runner: &'a dyn CommandRunner,
    normalizer: Normalizer,
    timeout: Option<Duration>,
}

impl<'a> SnapshotEngine<'a> {
    pub fn new(runner: &'a dyn CommandRunner, normalizer: Normalizer, timeout: Option<Duration>) -> Self {
        Self {
            runner,
            normalizer,
            timeout,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Run one test case to a terminal verdict.
    ///
    /// An existing reference is only ever read. A missing one is written
    /// from the raw captured bytes.
    pub async fn run(&self, case: &TestCase) -> Result<RunResult> {
        let executable = std::fs::canonicalize(&case.executable)
            .map_err(|e| HarnessError::io(&case.executable, e))?;
        let workdir = executable.parent().unwrap_or_else(|| Path::new("."));
        let cmd = CommandLine::new(&executable).current_dir(workdir);

        debug!(test = %case.name, executable = %executable.display(), "running test");
        let mut result = RunResult::new(&case.name, Verdict::Ok);
        let output = match self.runner.run(&cmd, self.timeout).await {
            Ok(output) => output,
            Err(HarnessError::Spawn { source, .. }) => {
                warn!(test = %case.name, error = %source, "test could not be started");
                result.verdict = Verdict::Failed;
                result.detail = Some(format!("could not start: {source}"));
                return Ok(result);
            }
            Err(e) => return Err(e),
        };
        result.duration_ms = output.duration_ms;

        if output.timed_out {
            warn!(test = %case.name, duration_ms = output.duration_ms, "test timed out");
            result.verdict = Verdict::Timeout;
            result.detail = Some(format!("killed after {}ms", output.duration_ms));
            return Ok(result);
        }

        if !output.stdout.is_empty() {
            debug!(test = %case.name, bytes = output.stdout.len(), "ignoring test stdout");
        }
        result.captured = output.stderr;

        if !case.snapshot.exists() {
            std::fs::write(&case.snapshot, &result.captured)
                .map_err(|e| HarnessError::io(&case.snapshot, e))?;
            info!(test = %case.name, snapshot = %case.snapshot.display(), "reference snapshot created");
            result.verdict = Verdict::New;
            return Ok(result);
        }

        let reference =
            std::fs::read(&case.snapshot).map_err(|e| HarnessError::io(&case.snapshot, e))?;
        if let Some(diff) = compare(&self.normalizer, &reference, &result.captured) {
            result.verdict = Verdict::Failed;
            result.diff = Some(diff);
        }
        Ok(result)
    }
}
