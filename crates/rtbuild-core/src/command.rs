//! Typed child-process command lines.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{HarnessError, Result};

/// A program plus its ordered argument list.
///
/// Arguments are kept as separate entries from construction to spawn; a
/// command line is never joined into a string and split again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run the child with `dir` as its working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Program name for logs and errors.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Arguments rendered lossily, for logs and assertions.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Check the command is spawnable as written.
    pub fn validate(&self) -> Result<()> {
        if self.program.is_empty() {
            return Err(HarnessError::InvalidCommand("empty program".to_string()));
        }
        if contains_nul(&self.program) {
            return Err(HarnessError::InvalidCommand(format!(
                "program {:?} contains a NUL byte",
                self.program
            )));
        }
        for (idx, arg) in self.args.iter().enumerate() {
            if arg.is_empty() {
                return Err(HarnessError::InvalidCommand(format!(
                    "{}: argument {idx} is empty",
                    self.program_name()
                )));
            }
            if contains_nul(arg) {
                return Err(HarnessError::InvalidCommand(format!(
                    "{}: argument {idx} contains a NUL byte",
                    self.program_name()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

fn contains_nul(s: &OsStr) -> bool {
    s.to_string_lossy().contains('\0')
}
