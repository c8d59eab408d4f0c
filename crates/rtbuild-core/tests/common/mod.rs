//! Shared fixtures: a throwaway project tree and an in-process toolchain.

#![allow(dead_code)]

use async_trait::async_trait;
use rtbuild_core::{CommandLine, CommandRunner, HarnessConfig, ProcessOutput, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Stand-in for gcc, ar and the compiled test programs.
///
/// - `gcc ... -c <src> -o <obj>` writes `obj:<src contents>`; a source
///   containing `#error` fails with exit code 1.
/// - `gcc ... <test.c> <archive> -o <exe>` writes the test source itself
///   as the "executable".
/// - `ar rcs <archive> <objs…>` writes the member file names, one per line.
/// - Any other program is a test executable: its file contents are
///   returned as stderr, and `stdout` is always `"ignored\n"`.
#[derive(Default)]
pub struct FakeToolchain {
    calls: Mutex<Vec<CommandLine>>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<CommandLine> {
        self.calls()
            .into_iter()
            .filter(|c| c.program_name() == program)
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

fn exited(code: i32, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        exit_code: Some(code),
        stderr: stderr.as_bytes().to_vec(),
        ..Default::default()
    }
}

#[async_trait]
impl CommandRunner for FakeToolchain {
    async fn run(&self, cmd: &CommandLine, _timeout: Option<Duration>) -> Result<ProcessOutput> {
        cmd.validate()?;
        self.calls.lock().unwrap().push(cmd.clone());
        let args = cmd.arg_strings();

        match cmd.program_name().as_str() {
            "gcc" => {
                let out_idx = args.iter().position(|a| a == "-o").expect("-o present") + 1;
                let output = PathBuf::from(&args[out_idx]);
                let source = args
                    .iter()
                    .find(|a| a.ends_with(".c"))
                    .map(PathBuf::from)
                    .expect("source present");
                let text = fs::read_to_string(&source).unwrap_or_default();
                if text.contains("#error") {
                    return Ok(exited(1, &format!("{}: error: forced failure", source.display())));
                }
                if args.iter().any(|a| a == "-c") {
                    fs::write(&output, format!("obj:{text}")).unwrap();
                } else {
                    fs::write(&output, text).unwrap();
                }
                Ok(exited(0, ""))
            }
            "ar" => {
                let archive = PathBuf::from(&args[1]);
                let members: Vec<String> = args[2..]
                    .iter()
                    .map(|m| {
                        Path::new(m)
                            .file_name()
                            .unwrap()
                            .to_string_lossy()
                            .into_owned()
                    })
                    .collect();
                fs::write(&archive, members.join("\n")).unwrap();
                Ok(exited(0, ""))
            }
            program => {
                let stderr = fs::read(program).unwrap_or_default();
                Ok(ProcessOutput {
                    exit_code: Some(0),
                    stdout: b"ignored\n".to_vec(),
                    stderr,
                    ..Default::default()
                })
            }
        }
    }
}

/// A project root with `src/` and `tests/` directories.
pub struct Project {
    pub dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("tests")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig::with_root(self.root())
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        fs::write(self.path(rel), contents).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    /// Install an executable shell script at `rel`.
    #[cfg(unix)]
    pub fn script(&self, rel: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.path(rel);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
