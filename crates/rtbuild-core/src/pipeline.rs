//! The `test` pipeline: debug build, test build, test run.

use std::io::Write;
use std::time::Instant;
use tracing::info;

use crate::error::Result;
use crate::mode::BuildMode;
use crate::orchestrator::{BuildOrchestrator, BuildReport};
use crate::runner::{SuiteReport, TestRunner};
use crate::test_builder::TestBuilder;

/// Result of a complete `test` invocation.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The debug build the tests were linked against.
    pub build: BuildReport,

    pub suite: SuiteReport,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn success(&self) -> bool {
        self.suite.is_success()
    }
}

/// Strictly ordered build → test-compile → test-run sequence.
pub struct TestPipeline;

impl TestPipeline {
    /// Rebuild the debug archive, rebuild every test program, then run
    /// every freshly built test and write the report to `out`.
    ///
    /// Build errors abort before any test runs. Test verdicts, failed or
    /// not, are returned in the suite report.
    pub async fn run(orchestrator: &BuildOrchestrator, out: &mut dyn Write) -> Result<PipelineResult> {
        let start = Instant::now();
        let config = orchestrator.config();

        let build = orchestrator.build(BuildMode::Debug).await?;

        let built = TestBuilder::new(config, orchestrator.runner())
            .build_all()
            .await?;

        let suite = TestRunner::new(config, orchestrator.runner())?
            .run(&built.built, &built.failed, out)
            .await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            tests = suite.results.len(),
            success = suite.is_success(),
            duration_ms,
            "test pipeline finished"
        );

        Ok(PipelineResult {
            build,
            suite,
            duration_ms,
        })
    }
}
