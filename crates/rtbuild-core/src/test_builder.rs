//! Test program compilation against the debug archive.

use tracing::{info, warn};

use crate::archiver::remove_if_exists;
use crate::command::CommandLine;
use crate::config::HarnessConfig;
use crate::discovery::{discover_test_sources, TestCase, TestSource};
use crate::error::{HarnessError, Result};
use crate::ledger::{OutputKind, OutputLedger};
use crate::mode::BuildMode;
use crate::process::CommandRunner;

/// A test whose build failed while failures were isolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBuildFailure {
    pub name: String,
    pub reason: String,
}

/// Result of building the whole test suite.
#[derive(Debug, Clone, Default)]
pub struct TestBuildReport {
    /// Tests built successfully, in discovery order.
    pub built: Vec<TestCase>,

    /// Tests skipped because they failed to build.
    pub failed: Vec<TestBuildFailure>,
}

/// Compiles each `tests/test_*.c` into an executable beside its source.
pub struct TestBuilder<'a> {
    config: &'a HarnessConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> TestBuilder<'a> {
    pub fn new(config: &'a HarnessConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// `<cc> <common…> <debug…> -I<src> <test.c> <debug archive> -o <exe> <link…>`
    pub fn test_command(&self, test: &TestSource) -> CommandLine {
        let mut include = std::ffi::OsString::from("-I");
        include.push(self.config.source_dir());

        CommandLine::new(&self.config.toolchain.compiler)
            .args(&self.config.flags.common)
            .args(self.config.mode_flags(BuildMode::Debug))
            .arg(include)
            .arg(&test.path)
            .arg(self.config.archive_path(BuildMode::Debug))
            .arg("-o")
            .arg(test.executable_path(self.config))
            .args(&self.config.tests.link_flags)
    }

    /// Build every discovered test program.
    ///
    /// The debug archive must already exist, or this fails with
    /// [`HarnessError::MissingArchive`]. By default the first failing test
    /// aborts the suite with [`HarnessError::TestBuild`]; with
    /// `tests.isolate_build_failures` the failure is recorded and the rest
    /// still build.
    pub async fn build_all(&self) -> Result<TestBuildReport> {
        let archive = self.config.archive_path(BuildMode::Debug);
        if !archive.is_file() {
            return Err(HarnessError::MissingArchive(archive));
        }

        let sources = discover_test_sources(self.config)?;
        info!(tests = sources.len(), "building tests");

        let ledger_path = self.config.ledger_path();
        let mut ledger = OutputLedger::load(&ledger_path)?;
        let mut report = TestBuildReport::default();

        for source in &sources {
            let executable = source.executable_path(self.config);
            // A stale binary must never stand in for one that failed to build.
            remove_if_exists(&executable)?;

            match self.build_one(source).await {
                Ok(()) => {
                    ledger.record(&self.config.root, &executable, OutputKind::TestExecutable, &[])?;
                    report.built.push(TestCase::new(self.config, &source.name));
                }
                Err(HarnessError::TestBuild { test, reason })
                    if self.config.tests.isolate_build_failures =>
                {
                    warn!(test = %test, "test build failed, skipping");
                    report.failed.push(TestBuildFailure { name: test, reason });
                }
                Err(e) => {
                    ledger.save(&ledger_path)?;
                    return Err(e);
                }
            }
        }

        ledger.save(&ledger_path)?;
        Ok(report)
    }

    async fn build_one(&self, source: &TestSource) -> Result<()> {
        let cmd = self.test_command(source);
        info!(test = %source.name, "compiling test");

        let output = self.runner.run(&cmd, None).await?;
        if !output.success() {
            return Err(HarnessError::TestBuild {
                test: source.name.clone(),
                reason: match output.exit_code {
                    Some(code) => format!("compiler exited with code {code}: {}", output.stderr_text()),
                    None => format!("compiler terminated by signal: {}", output.stderr_text()),
                },
            });
        }

        let diagnostics = output.stderr_text();
        if !diagnostics.is_empty() {
            warn!(test = %source.name, "{diagnostics}");
        }
        Ok(())
    }
}
