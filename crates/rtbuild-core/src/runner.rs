//! Test suite execution and reporting.

use std::io::Write;
use tracing::info;

use crate::config::HarnessConfig;
use crate::discovery::{discover_test_executables, TestCase};
use crate::error::{HarnessError, Result};
use crate::process::CommandRunner;
use crate::report::{render_result, render_totals};
use crate::snapshot::{Normalizer, RunResult, SnapshotEngine, Verdict};
use crate::test_builder::TestBuildFailure;

/// Ordered results of one suite run.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub results: Vec<RunResult>,
}

impl SuiteReport {
    /// Number of results with `verdict`.
    pub fn count(&self, verdict: Verdict) -> usize {
        self.results.iter().filter(|r| r.verdict == verdict).count()
    }

    /// Whether no result failed, timed out or failed to build.
    pub fn is_success(&self) -> bool {
        !self.results.iter().any(|r| r.verdict.is_failure())
    }
}

/// Drives the snapshot engine over a set of test cases.
pub struct TestRunner<'a> {
    config: &'a HarnessConfig,
    engine: SnapshotEngine<'a>,
}

impl<'a> TestRunner<'a> {
    pub fn new(config: &'a HarnessConfig, runner: &'a dyn CommandRunner) -> Result<Self> {
        let normalizer = Normalizer::new(&config.normalize.pattern)?;
        let engine = SnapshotEngine::new(runner, normalizer, config.test_timeout());
        Ok(Self { config, engine })
    }

    /// Discover compiled tests and run them all.
    pub async fn run_discovered(&self, out: &mut dyn Write) -> Result<SuiteReport> {
        let cases = discover_test_executables(self.config)?;
        self.run(&cases, &[], out).await
    }

    /// Run `cases` in order, writing each block to `out` as it completes.
    ///
    /// `build_failures` are reported first, each as `BuildFailed`. A
    /// mismatch never stops the run; only harness errors do.
    pub async fn run(
        &self,
        cases: &[TestCase],
        build_failures: &[TestBuildFailure],
        out: &mut dyn Write,
    ) -> Result<SuiteReport> {
        info!(tests = cases.len(), "running tests");
        writeln!(out, "\nRunning unit tests:").map_err(HarnessError::Report)?;

        let mut report = SuiteReport::default();
        for failure in build_failures {
            let result = RunResult::build_failed(&failure.name, &failure.reason);
            emit(out, &result)?;
            report.results.push(result);
        }

        for case in cases {
            let result = self.engine.run(case).await?;
            info!(test = %result.name, verdict = %result.verdict, duration_ms = result.duration_ms, "test finished");
            emit(out, &result)?;
            report.results.push(result);
        }

        writeln!(out, "\n{}", render_totals(&report)).map_err(HarnessError::Report)?;
        out.flush().map_err(HarnessError::Report)?;
        Ok(report)
    }
}

fn emit(out: &mut dyn Write, result: &RunResult) -> Result<()> {
    // Whole block in one write so per-test output never interleaves.
    out.write_all(render_result(result).as_bytes())
        .map_err(HarnessError::Report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_success_ignores_new() {
        let report = SuiteReport {
            results: vec![
                RunResult::new("a", Verdict::New),
                RunResult::new("b", Verdict::Ok),
            ],
        };
        assert!(report.is_success());
        assert_eq!(report.count(Verdict::New), 1);
    }

    #[test]
    fn test_suite_fails_on_any_failure() {
        let report = SuiteReport {
            results: vec![
                RunResult::new("a", Verdict::Ok),
                RunResult::new("b", Verdict::Timeout),
            ],
        };
        assert!(!report.is_success());
    }

    #[test]
    fn test_empty_suite_is_success() {
        assert!(SuiteReport::default().is_success());
    }
}
