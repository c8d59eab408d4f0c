//! Single source-to-object compiles.

use std::path::Path;
use tracing::{info, warn};

use crate::command::CommandLine;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::mode::BuildMode;
use crate::process::CommandRunner;

/// Compiles one translation unit with the flag set of a build mode.
pub struct CompilerInvoker<'a> {
    config: &'a HarnessConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> CompilerInvoker<'a> {
    pub fn new(config: &'a HarnessConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// `<cc> <common…> <mode…> -c <source> -o <object>`
    pub fn object_command(&self, source: &Path, object: &Path, mode: BuildMode) -> CommandLine {
        CommandLine::new(&self.config.toolchain.compiler)
            .args(&self.config.flags.common)
            .args(self.config.mode_flags(mode))
            .arg("-c")
            .arg(source)
            .arg("-o")
            .arg(object)
    }

    /// Compile `source` into `object`, overwriting any previous object.
    ///
    /// A non-zero compiler exit is a [`HarnessError::Compile`] carrying the
    /// compiler's stderr. There is no retry.
    pub async fn compile(&self, source: &Path, object: &Path, mode: BuildMode) -> Result<()> {
        let cmd = self.object_command(source, object, mode);
        info!(mode = %mode, source = %source.display(), "compiling");

        let output = self.runner.run(&cmd, None).await?;
        if !output.success() {
            return Err(HarnessError::Compile {
                source_path: source.to_path_buf(),
                exit_code: output.exit_code,
                stderr: output.stderr_text(),
            });
        }

        let diagnostics = output.stderr_text();
        if !diagnostics.is_empty() {
            warn!(source = %source.display(), "{diagnostics}");
        }
        Ok(())
    }
}
