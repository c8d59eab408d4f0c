//! Static archive creation.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::CommandLine;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::process::CommandRunner;

/// Packs one mode's object files into a static archive.
pub struct Archiver<'a> {
    config: &'a HarnessConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> Archiver<'a> {
    pub fn new(config: &'a HarnessConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    /// `<ar> <flags…> <archive> <objects…>` with objects in sorted order.
    pub fn archive_command(&self, archive: &Path, objects: &[PathBuf]) -> CommandLine {
        CommandLine::new(&self.config.toolchain.archiver)
            .args(&self.config.toolchain.archiver_flags)
            .arg(archive)
            .args(sorted(objects))
    }

    /// Build `archive` from exactly `objects`.
    ///
    /// Every object must exist. A previous archive at the same path is
    /// removed first so stale members never carry over. Returns the member
    /// list in archive order.
    pub async fn archive(&self, archive: &Path, objects: &[PathBuf]) -> Result<Vec<PathBuf>> {
        if let Some(missing) = objects.iter().find(|o| !o.is_file()) {
            return Err(HarnessError::MissingObject(missing.clone()));
        }

        remove_if_exists(archive)?;

        let members = sorted(objects);
        let cmd = self.archive_command(archive, &members);
        info!(archive = %archive.display(), members = members.len(), "archiving");

        let output = self.runner.run(&cmd, None).await?;
        if !output.success() {
            return Err(HarnessError::Archive {
                archive: archive.to_path_buf(),
                exit_code: output.exit_code,
                stderr: output.stderr_text(),
            });
        }
        Ok(members)
    }
}

fn sorted(objects: &[PathBuf]) -> Vec<PathBuf> {
    let mut members = objects.to_vec();
    members.sort();
    members
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(HarnessError::io(path, e)),
    }
}
