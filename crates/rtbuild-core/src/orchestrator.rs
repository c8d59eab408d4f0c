//! Build orchestration: compile every source for a mode, then archive.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::archiver::{remove_if_exists, Archiver};
use crate::compiler::CompilerInvoker;
use crate::config::HarnessConfig;
use crate::discovery::discover_sources;
use crate::error::{HarnessError, Result};
use crate::ledger::{OutputKind, OutputLedger};
use crate::mode::BuildMode;
use crate::process::{CommandRunner, SystemRunner};

/// Outcome of one `build(mode)` call.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub mode: BuildMode,

    /// Object files, in source order.
    pub objects: Vec<PathBuf>,

    pub archive: PathBuf,

    /// Archive members in archive order.
    pub members: Vec<PathBuf>,

    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of `clean`.
#[derive(Debug, Clone, Default)]
pub struct CleanReport {
    /// Files and directories that existed and were removed.
    pub removed: Vec<PathBuf>,
}

/// Sequences compiles and archiving for the two build modes.
pub struct BuildOrchestrator {
    config: HarnessConfig,
    runner: Arc<dyn CommandRunner>,
}

impl BuildOrchestrator {
    pub fn new(config: HarnessConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    /// Orchestrator that spawns real child processes.
    pub fn with_system_runner(config: HarnessConfig) -> Self {
        Self::new(config, Arc::new(SystemRunner))
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Recompile every source with `mode`'s flags and rebuild its archive.
    ///
    /// Nothing is cached: each call rewrites every object. The mode's
    /// existing archive is removed up front, so a failed compile leaves no
    /// archive behind.
    pub async fn build(&self, mode: BuildMode) -> Result<BuildReport> {
        let start = Instant::now();
        let sources = discover_sources(&self.config)?;
        let out_dir = self.config.mode_dir(mode);
        let archive = self.config.archive_path(mode);

        std::fs::create_dir_all(&out_dir).map_err(|e| HarnessError::io(&out_dir, e))?;
        remove_if_exists(&archive)?;

        info!(mode = %mode, sources = sources.len(), "building");

        let compiler = CompilerInvoker::new(&self.config, self.runner());
        let mut objects = Vec::with_capacity(sources.len());
        for source in &sources {
            let object = out_dir.join(format!("{}.o", source.stem));
            compiler.compile(&source.path, &object, mode).await?;
            objects.push(object);
        }

        let members = Archiver::new(&self.config, self.runner())
            .archive(&archive, &objects)
            .await?;

        let root = &self.config.root;
        let ledger_path = self.config.ledger_path();
        let mut ledger = OutputLedger::load(&ledger_path)?;
        for object in &objects {
            ledger.record(root, object, OutputKind::Object, &[])?;
        }
        ledger.record(root, &archive, OutputKind::Archive, &members)?;
        ledger.save(&ledger_path)?;

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(mode = %mode, archive = %archive.display(), duration_ms, "build complete");

        Ok(BuildReport {
            mode,
            objects,
            archive,
            members,
            duration_ms,
        })
    }

    /// Remove every generated output.
    ///
    /// Deletes the outputs recorded in the ledger, the ledger itself and
    /// the build directory. Files the harness never wrote are left alone,
    /// so sources and reference snapshots stay.
    pub fn clean(&self) -> Result<CleanReport> {
        self.config.validate()?;
        let root = &self.config.root;
        let ledger_path = self.config.ledger_path();
        let ledger = OutputLedger::load(&ledger_path)?;

        let mut report = CleanReport::default();
        let mut remove = |path: PathBuf| -> Result<()> {
            if path.is_file() {
                remove_if_exists(&path)?;
                debug!(path = %path.display(), "removed");
                report.removed.push(path);
            }
            Ok(())
        };

        for path in ledger.paths(root) {
            remove(path)?;
        }
        remove(ledger_path)?;

        let build_dir = self.config.build_dir();
        if build_dir.is_dir() {
            std::fs::remove_dir_all(&build_dir).map_err(|e| HarnessError::io(&build_dir, e))?;
            report.removed.push(build_dir);
        }

        info!(removed = report.removed.len(), "clean complete");
        Ok(report)
    }
}
