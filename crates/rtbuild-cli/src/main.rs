//! rtbuild - build and regression harness CLI
//!
//! ## Commands
//!
//! - `build [mode]`: compile the library and archive it (default: release)
//! - `debug`: shorthand for `build debug`
//! - `test`: debug build, build every test program, run the snapshot suite
//! - `clean`: remove every generated output (snapshots are kept)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

use rtbuild_core::{
    BuildMode, BuildOrchestrator, BuildReport, HarnessConfig, SuiteReport, TestPipeline,
};

#[derive(Parser)]
#[command(name = "rtbuild")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build and snapshot-regression harness for the randomtrees library", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Project root (default: current directory)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file (default: <root>/rtbuild.toml when present)
    #[arg(long, global = true, env = "RTBUILD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile all sources for a mode and build its archive
    Build {
        /// Build mode: release or debug
        #[arg(default_value = "release")]
        mode: BuildMode,
    },

    /// Build the debug archive
    Debug,

    /// Debug build, test build, then run every test against its snapshot
    Test,

    /// Remove generated outputs
    Clean,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    rtbuild_core::init_tracing(cli.json, level);

    let config = HarnessConfig::load(&cli.root, cli.config.as_deref())
        .context("Failed to load harness configuration")?;
    let orchestrator = BuildOrchestrator::with_system_runner(config);

    match cli.command {
        Commands::Build { mode } => cmd_build(&orchestrator, mode).await,
        Commands::Debug => cmd_build(&orchestrator, BuildMode::Debug).await,
        Commands::Test => cmd_test(&orchestrator).await,
        Commands::Clean => cmd_clean(&orchestrator),
    }
}

/// Build one mode
async fn cmd_build(orchestrator: &BuildOrchestrator, mode: BuildMode) -> Result<ExitCode> {
    let report = orchestrator
        .build(mode)
        .await
        .with_context(|| format!("{mode} build failed"))?;
    print_build(&report);
    Ok(ExitCode::SUCCESS)
}

/// Debug build, test build, test run
async fn cmd_test(orchestrator: &BuildOrchestrator) -> Result<ExitCode> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = TestPipeline::run(orchestrator, &mut out)
        .await
        .context("Test pipeline failed")?;
    out.flush().context("Failed to flush report")?;

    Ok(ExitCode::from(suite_exit_status(&result.suite)))
}

/// 1 when any test failed, timed out or did not build; `NEW` passes.
fn suite_exit_status(suite: &SuiteReport) -> u8 {
    if suite.is_success() {
        0
    } else {
        1
    }
}

/// Remove generated outputs
fn cmd_clean(orchestrator: &BuildOrchestrator) -> Result<ExitCode> {
    let report = orchestrator.clean().context("Clean failed")?;
    println!("Removed {} generated output(s)", report.removed.len());
    Ok(ExitCode::SUCCESS)
}

fn print_build(report: &BuildReport) {
    println!(
        "Built {} ({} objects, {}ms): {}",
        report.mode,
        report.objects.len(),
        report.duration_ms,
        report.archive.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtbuild_core::{RunResult, Verdict};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rtbuild").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    fn suite(verdicts: &[Verdict]) -> SuiteReport {
        SuiteReport {
            results: verdicts
                .iter()
                .enumerate()
                .map(|(i, verdict)| RunResult {
                    name: format!("test_{i}"),
                    verdict: *verdict,
                    captured: Vec::new(),
                    diff: None,
                    detail: None,
                    duration_ms: 0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_build_defaults_to_release() {
        let cli = parse(&["build"]);
        assert!(matches!(cli.command, Commands::Build { mode: BuildMode::Release }));
    }

    #[test]
    fn test_build_accepts_debug_mode() {
        let cli = parse(&["build", "debug"]);
        assert!(matches!(cli.command, Commands::Build { mode: BuildMode::Debug }));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["rtbuild", "build", "fast"]).is_err());
    }

    #[test]
    fn test_operations_parse() {
        assert!(matches!(parse(&["debug"]).command, Commands::Debug));
        assert!(matches!(parse(&["test"]).command, Commands::Test));
        assert!(matches!(parse(&["clean"]).command, Commands::Clean));
        assert!(Cli::try_parse_from(["rtbuild"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["test", "-C", "/work/rt", "--verbose", "--json"]);
        assert_eq!(cli.root, PathBuf::from("/work/rt"));
        assert!(cli.verbose);
        assert!(cli.json);
    }

    #[test]
    fn test_exit_status_follows_verdicts() {
        assert_eq!(suite_exit_status(&suite(&[])), 0);
        assert_eq!(suite_exit_status(&suite(&[Verdict::Ok, Verdict::New])), 0);
        assert_eq!(suite_exit_status(&suite(&[Verdict::Ok, Verdict::Failed])), 1);
        assert_eq!(suite_exit_status(&suite(&[Verdict::Timeout])), 1);
        assert_eq!(suite_exit_status(&suite(&[Verdict::BuildFailed, Verdict::Ok])), 1);
    }
}
