//! Locating the ipset utility and gating on its version.
//!
//! A missing binary or a confirmed too-old version is fatal. A version that
//! cannot be queried or parsed is logged and treated as compatible.

use std::env;
use std::ffi::OsStr;
use std::fmt;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::cmd_abstraction::{args_to_strings, CommandExecutor};
use crate::error::{IpsetError, Result};
use crate::output;

/// Name of the utility searched for on `PATH`.
pub const IPSET_BINARY: &str = "ipset";

/// A `major.minor.patch` ipset version.
///
/// ipset only reports `major.minor`; the patch component is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IpsetVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl IpsetVersion {
    /// Oldest ipset with the command grammar this crate speaks.
    pub const MINIMUM: IpsetVersion = IpsetVersion::new(6, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `ipset --version` output.
    pub fn from_output(output: &str) -> Result<Self> {
        let (_, major, minor) = output::version_token(output).ok_or_else(|| {
            IpsetError::VersionIndeterminate(format!(
                "no ipset version found in string: {}",
                output.trim_end()
            ))
        })?;
        Ok(Self::new(major, minor, 0))
    }

    pub fn is_supported(&self) -> bool {
        *self >= Self::MINIMUM
    }
}

impl fmt::Display for IpsetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Search `PATH` for the ipset executable.
pub fn locate() -> Result<PathBuf> {
    let path = env::var_os("PATH").ok_or(IpsetError::ExecutableNotFound)?;
    find_in_path(IPSET_BINARY, &path).ok_or(IpsetError::ExecutableNotFound)
}

/// First executable regular file named `name` in a `PATH`-style list.
pub fn find_in_path(name: &str, path: &OsStr) -> Option<PathBuf> {
    env::split_paths(path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Ask the utility for its version.
///
/// Spawn failures, non-zero exits and unparseable output all map to
/// [`IpsetError::VersionIndeterminate`].
pub fn query_version<E: CommandExecutor>(executor: &E, ipset: &Path) -> Result<IpsetVersion> {
    let program = ipset.to_string_lossy();
    let out = executor
        .execute(&program, &args_to_strings(&["--version"]))
        .map_err(|e| IpsetError::VersionIndeterminate(format!("failed to run ipset: {}", e)))?;
    if !out.success {
        return Err(IpsetError::VersionIndeterminate(format!(
            "ipset --version failed ({})",
            out.combined().trim_end()
        )));
    }
    IpsetVersion::from_output(&out.combined())
}

/// Check that the utility is recent enough.
///
/// Fails open when the version cannot be determined and fails closed when it
/// is determined to be older than [`IpsetVersion::MINIMUM`].
pub fn check_version<E: CommandExecutor>(executor: &E, ipset: &Path) -> Result<Option<IpsetVersion>> {
    match query_version(executor, ipset) {
        Ok(version) if version.is_supported() => {
            debug!("Found ipset {} at {}", version, ipset.display());
            Ok(Some(version))
        }
        Ok(version) => Err(IpsetError::UnsupportedVersion {
            found: version,
            minimum: IpsetVersion::MINIMUM,
        }),
        Err(e) => {
            warn!(
                "Error checking ipset version, assuming version at least {}: {}",
                IpsetVersion::MINIMUM,
                e
            );
            Ok(None)
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any "vX.Y" token parses to X.Y.0
        #[test]
        fn prop_version_token_parses(major in 0u64..1000, minor in 0u64..1000) {
            let out = format!("ipset v{}.{}, protocol version: 7\n", major, minor);
            let v = IpsetVersion::from_output(&out).unwrap();
            prop_assert_eq!(v, IpsetVersion::new(major, minor, 0));
        }

        /// Support is decided by the major component alone for minimum 6.0
        #[test]
        fn prop_supported_iff_major_at_least_six(major in 0u64..100, minor in 0u64..100) {
            let v = IpsetVersion::new(major, minor, 0);
            prop_assert_eq!(v.is_supported(), major >= 6);
        }
    }
}
