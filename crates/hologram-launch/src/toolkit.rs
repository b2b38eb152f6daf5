//! Toolkit capability parameter
//!
//! Behaviour that depends on the accelerator toolkit release is decided from a
//! single [`ToolkitVersion`] value, resolved once at startup and passed to the
//! launch builder and the option marshaller.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::{LaunchError, Result};

/// Toolkit release, as `major.minor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolkitVersion {
    pub major: u32,
    pub minor: u32,
}

impl ToolkitVersion {
    /// Newest release this crate knows about
    pub const LATEST: Self = Self::new(12, 4);

    /// Environment variable read by [`ToolkitVersion::from_env`]
    pub const ENV_VAR: &'static str = "HOLOGRAM_TOOLKIT_VERSION";

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Occupancy queries for jointly optimal block and grid sizes exist from 10.0 on
    pub const fn supports_occupancy_api(&self) -> bool {
        self.major >= 10
    }

    /// Prefix of `--gpu-architecture` values
    ///
    /// Releases before 11.0 target virtual architectures (`compute_XY`),
    /// later ones real architectures (`sm_XY`).
    pub const fn architecture_prefix(&self) -> &'static str {
        if self.major < 11 {
            "compute_"
        } else {
            "sm_"
        }
    }

    /// Read the version from `HOLOGRAM_TOOLKIT_VERSION`
    ///
    /// Falls back to [`ToolkitVersion::LATEST`] when the variable is unset or
    /// cannot be parsed.
    pub fn from_env() -> Self {
        match env::var(Self::ENV_VAR) {
            Ok(value) => match value.parse() {
                Ok(version) => version,
                Err(err) => {
                    tracing::warn!(%err, fallback = %Self::LATEST, "ignoring {}", Self::ENV_VAR);
                    Self::LATEST
                }
            },
            Err(_) => Self::LATEST,
        }
    }
}

impl Default for ToolkitVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for ToolkitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ToolkitVersion {
    type Err = LaunchError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LaunchError::InvalidToolkitVersion(s.to_string());
        let trimmed = s.trim();
        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed, "0"),
        };
        let major = major.parse().map_err(|_| invalid())?;
        let minor = minor.parse().map_err(|_| invalid())?;
        Ok(Self::new(major, minor))
    }
}
