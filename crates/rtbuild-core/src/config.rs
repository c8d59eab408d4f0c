//! Harness configuration.
//!
//! Every knob the orchestrator needs (toolchain names, per-mode flag sets,
//! directory layout, test settings) lives in one [`HarnessConfig`] value
//! that is passed explicitly into the build and test components. The value
//! is loaded from an optional `rtbuild.toml` in the project root; missing
//! sections and fields fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::error::{HarnessError, Result};
use crate::mode::BuildMode;

/// File name looked up in the project root when no explicit config is given.
pub const DEFAULT_CONFIG_FILE: &str = "rtbuild.toml";

/// Default timestamp prefix pattern: a leading bracketed span immediately
/// followed by a colon. The span is dropped, `rest` is kept.
pub const DEFAULT_NORMALIZE_PATTERN: &str = r"^\[[^\[\]]*\](?P<rest>:.*)$";

/// External tools used for building.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolchainConfig {
    /// C compiler executable.
    pub compiler: String,

    /// Static archiver executable.
    pub archiver: String,

    /// Archiver operation flags, placed before the archive path.
    pub archiver_flags: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: "gcc".to_string(),
            archiver: "ar".to_string(),
            archiver_flags: vec!["rcs".to_string()],
        }
    }
}

/// Compiler flag sets. Each entry is a single argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlagConfig {
    /// Language level and warnings, shared by every compile.
    pub common: Vec<String>,

    /// Appended for [`BuildMode::Debug`] and for test programs.
    pub debug: Vec<String>,

    /// Appended for [`BuildMode::Release`].
    pub release: Vec<String>,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            common: to_strings(&["-std=c99", "-Wall", "-W", "-Wno-unused-parameter"]),
            debug: to_strings(&["-O0", "-g", "-DDEBUG"]),
            release: to_strings(&["-O3"]),
        }
    }
}

/// Directory layout, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub source_dir: PathBuf,

    /// Extension (without dot) of compilable sources and test sources.
    pub source_extension: String,

    /// Parent of the per-mode output directories.
    pub build_dir: PathBuf,

    pub archive_name: String,

    pub test_dir: PathBuf,

    /// File-name prefix that marks test sources and test executables.
    pub test_prefix: String,

    /// Appended to the test name to form the reference snapshot file name.
    pub snapshot_suffix: String,

    /// Output ledger file name, placed in the project root.
    pub ledger_file: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            source_extension: "c".to_string(),
            build_dir: PathBuf::from("build"),
            archive_name: "librandomtrees.a".to_string(),
            test_dir: PathBuf::from("tests"),
            test_prefix: "test_".to_string(),
            snapshot_suffix: ".out".to_string(),
            ledger_file: ".rtbuild-outputs.json".to_string(),
        }
    }
}

/// Test build and execution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TestConfig {
    /// Link flags placed after the output path (math runtime by default).
    pub link_flags: Vec<String>,

    /// Per-test wall-clock limit in seconds. 0 disables the limit.
    pub timeout_secs: u64,

    /// Skip a test whose build fails instead of aborting the suite.
    pub isolate_build_failures: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            link_flags: to_strings(&["-lm"]),
            timeout_secs: 60,
            isolate_build_failures: false,
        }
    }
}

/// Diagnostic-output normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Regex matched against each line; must define a `rest` group.
    pub pattern: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_NORMALIZE_PATTERN.to_string(),
        }
    }
}

/// Complete configuration for one project root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Project root every layout path is resolved against.
    #[serde(skip)]
    pub root: PathBuf,

    pub toolchain: ToolchainConfig,
    pub flags: FlagConfig,
    pub layout: LayoutConfig,
    pub tests: TestConfig,
    pub normalize: NormalizeConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            toolchain: ToolchainConfig::default(),
            flags: FlagConfig::default(),
            layout: LayoutConfig::default(),
            tests: TestConfig::default(),
            normalize: NormalizeConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load configuration for `root`.
    ///
    /// An explicit `path` must exist. Without one, `<root>/rtbuild.toml` is
    /// used when present and the defaults otherwise. The result is validated.
    pub fn load(root: &Path, path: Option<&Path>) -> Result<Self> {
        let candidate = match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let default_path = root.join(DEFAULT_CONFIG_FILE);
                default_path.is_file().then_some(default_path)
            }
        };

        let mut config = match candidate {
            Some(file) => {
                let text = std::fs::read_to_string(&file)
                    .map_err(|e| HarnessError::io(&file, e))?;
                let parsed = Self::from_toml_str(&text).map_err(|e| match e {
                    HarnessError::Config(msg) => {
                        HarnessError::Config(format!("{}: {msg}", file.display()))
                    }
                    other => other,
                })?;
                tracing::debug!(config = %file.display(), "loaded harness configuration");
                parsed
            }
            None => Self::default(),
        };

        config.root = root.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document. The root is left at its default.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Reject configurations the orchestrator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.toolchain.compiler.trim().is_empty() {
            return Err(HarnessError::Config("compiler must not be empty".to_string()));
        }
        if self.toolchain.archiver.trim().is_empty() {
            return Err(HarnessError::Config("archiver must not be empty".to_string()));
        }

        let flag_sets = [
            ("toolchain.archiver_flags", &self.toolchain.archiver_flags),
            ("flags.common", &self.flags.common),
            ("flags.debug", &self.flags.debug),
            ("flags.release", &self.flags.release),
            ("tests.link_flags", &self.tests.link_flags),
        ];
        for (section, flags) in flag_sets {
            for flag in flags {
                if flag.is_empty() {
                    return Err(HarnessError::Config(format!("{section}: empty flag")));
                }
                if flag.chars().any(char::is_whitespace) {
                    return Err(HarnessError::Config(format!(
                        "{section}: flag '{flag}' contains whitespace; list each flag separately"
                    )));
                }
            }
        }

        if self.layout.archive_name.is_empty() {
            return Err(HarnessError::Config("archive_name must not be empty".to_string()));
        }
        if self.layout.test_prefix.is_empty() {
            return Err(HarnessError::Config("test_prefix must not be empty".to_string()));
        }
        if self.layout.source_extension.is_empty() || self.layout.source_extension.contains('.') {
            return Err(HarnessError::Config(format!(
                "source_extension '{}' must be a bare extension such as 'c'",
                self.layout.source_extension
            )));
        }
        if !self.layout.snapshot_suffix.contains('.') {
            // Snapshots must carry an extension or they would be picked up as executables.
            return Err(HarnessError::Config(format!(
                "snapshot_suffix '{}' must contain a file extension",
                self.layout.snapshot_suffix
            )));
        }

        self.check_build_dir()?;
        crate::snapshot::Normalizer::new(&self.normalize.pattern)?;
        Ok(())
    }

    /// `clean` removes the build directory wholesale, so it must sit below
    /// the root and hold neither sources nor tests.
    fn check_build_dir(&self) -> Result<()> {
        let cwd = std::env::current_dir().map_err(|e| HarnessError::io(".", e))?;
        let root = lexical(&cwd.join(&self.root));
        let build = lexical(&root.join(&self.layout.build_dir));
        let build_dir = self.layout.build_dir.display();

        if root.starts_with(&build) {
            return Err(HarnessError::Config(format!(
                "build_dir '{build_dir}' must be a subdirectory of the project root"
            )));
        }
        for (name, dir) in [
            ("source_dir", &self.layout.source_dir),
            ("test_dir", &self.layout.test_dir),
        ] {
            if lexical(&root.join(dir)).starts_with(&build) {
                return Err(HarnessError::Config(format!(
                    "build_dir '{build_dir}' must not contain {name} '{}'",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Mode-specific compiler flags.
    pub fn mode_flags(&self, mode: BuildMode) -> &[String] {
        match mode {
            BuildMode::Debug => &self.flags.debug,
            BuildMode::Release => &self.flags.release,
        }
    }

    /// Per-test timeout, `None` when disabled.
    pub fn test_timeout(&self) -> Option<Duration> {
        (self.tests.timeout_secs > 0).then(|| Duration::from_secs(self.tests.timeout_secs))
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.layout.source_dir)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(&self.layout.build_dir)
    }

    /// Output directory for one mode's objects and archive.
    pub fn mode_dir(&self, mode: BuildMode) -> PathBuf {
        self.build_dir().join(mode.name())
    }

    pub fn archive_path(&self, mode: BuildMode) -> PathBuf {
        self.mode_dir(mode).join(&self.layout.archive_name)
    }

    pub fn test_dir(&self) -> PathBuf {
        self.root.join(&self.layout.test_dir)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(&self.layout.ledger_file)
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn to_strings(flags: &[&str]) -> Vec<String> {
    flags.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_toolchain() {
        let config = HarnessConfig::default();
        assert_eq!(config.toolchain.compiler, "gcc");
        assert_eq!(config.toolchain.archiver_flags, vec!["rcs"]);
        assert_eq!(
            config.flags.common,
            vec!["-std=c99", "-Wall", "-W", "-Wno-unused-parameter"]
        );
        assert_eq!(config.mode_flags(BuildMode::Debug), ["-O0", "-g", "-DDEBUG"]);
        assert_eq!(config.mode_flags(BuildMode::Release), ["-O3"]);
        assert_eq!(config.tests.link_flags, vec!["-lm"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_paths_resolve_against_root() {
        let config = HarnessConfig::with_root("/work/rt");
        assert_eq!(config.source_dir(), PathBuf::from("/work/rt/src"));
        assert_eq!(config.mode_dir(BuildMode::Debug), PathBuf::from("/work/rt/build/debug"));
        assert_eq!(
            config.archive_path(BuildMode::Release),
            PathBuf::from("/work/rt/build/release/librandomtrees.a")
        );
        assert_eq!(config.ledger_path(), PathBuf::from("/work/rt/.rtbuild-outputs.json"));
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = HarnessConfig::from_toml_str(
            r#"
            [toolchain]
            compiler = "clang"

            [tests]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.toolchain.compiler, "clang");
        assert_eq!(config.toolchain.archiver, "ar");
        assert_eq!(config.test_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let mut config = HarnessConfig::default();
        config.tests.timeout_secs = 0;
        assert_eq!(config.test_timeout(), None);
    }

    #[test]
    fn test_joined_flag_string_rejected() {
        let mut config = HarnessConfig::default();
        config.flags.debug = vec!["-O0 -g".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("list each flag separately"));
    }

    #[test]
    fn test_empty_compiler_rejected() {
        let mut config = HarnessConfig::default();
        config.toolchain.compiler = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pattern_without_rest_group_rejected() {
        let mut config = HarnessConfig::default();
        config.normalize.pattern = r"^\[.*\]".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_dir_resolving_to_root_rejected() {
        for dir in [".", "", "build/..", "./", ".."] {
            let mut config = HarnessConfig::with_root("/work/rt");
            config.layout.build_dir = PathBuf::from(dir);
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains("subdirectory of the project root"),
                "build_dir {dir:?}: {err}"
            );
        }
    }

    #[test]
    fn test_build_dir_holding_sources_or_tests_rejected() {
        let mut config = HarnessConfig::with_root("/work/rt");
        config.layout.build_dir = PathBuf::from("src");
        assert!(config.validate().unwrap_err().to_string().contains("source_dir"));

        let mut config = HarnessConfig::with_root("/work/rt");
        config.layout.build_dir = PathBuf::from("out");
        config.layout.test_dir = PathBuf::from("out/tests");
        assert!(config.validate().unwrap_err().to_string().contains("test_dir"));
    }

    #[test]
    fn test_nested_build_dir_accepted() {
        let mut config = HarnessConfig::with_root("/work/rt");
        config.layout.build_dir = PathBuf::from("target/./c");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.toolchain, ToolchainConfig::default());
    }

    #[test]
    fn test_load_reads_root_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[layout]\narchive_name = \"libother.a\"\n",
        )
        .unwrap();
        let config = HarnessConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.layout.archive_name, "libother.a");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = HarnessConfig::load(dir.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}
