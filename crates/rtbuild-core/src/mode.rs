//! Build profiles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HarnessError;

/// The two supported compilation profiles.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// Unoptimized, debug symbols and assertions; feeds the test suite.
    Debug,

    /// Optimized, shippable archive.
    #[default]
    Release,
}

impl BuildMode {
    /// Both modes, in a stable order.
    pub const ALL: [BuildMode; 2] = [BuildMode::Debug, BuildMode::Release];

    /// Directory and display name of the mode.
    pub fn name(&self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildMode {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildMode::Debug),
            "release" => Ok(BuildMode::Release),
            other => Err(HarnessError::Config(format!(
                "unknown build mode '{other}' (expected 'debug' or 'release')"
            ))),
        }
    }
}
