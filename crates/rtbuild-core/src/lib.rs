//! rtbuild - build and regression harness for the randomtrees C library
//!
//! Provides:
//! - Debug and release builds of the library sources into static archives
//! - Compilation of `tests/test_*.c` programs against the debug archive
//! - Snapshot regression of each test's diagnostic output, with timestamp
//!   prefixes masked before comparison

pub mod archiver;
pub mod command;
pub mod compiler;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ledger;
pub mod mode;
pub mod orchestrator;
pub mod pipeline;
pub mod process;
pub mod report;
pub mod runner;
pub mod snapshot;
pub mod telemetry;
pub mod test_builder;

// Re-export key types
pub use command::CommandLine;
pub use config::HarnessConfig;
pub use discovery::{SourceUnit, TestCase, TestSource};
pub use error::{HarnessError, Result};
pub use ledger::{OutputKind, OutputLedger};
pub use mode::BuildMode;
pub use orchestrator::{BuildOrchestrator, BuildReport, CleanReport};
pub use pipeline::{PipelineResult, TestPipeline};
pub use process::{CommandRunner, ProcessOutput, SystemRunner};
pub use runner::{SuiteReport, TestRunner};
pub use snapshot::{LineDiff, Normalizer, RunResult, SnapshotEngine, Verdict};
pub use telemetry::init_tracing;
pub use test_builder::{TestBuildReport, TestBuilder};
