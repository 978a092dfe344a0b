//! Set metadata and the handle returned by [`SetManager::create`].
//!
//! Member data is never cached here: it lives in the kernel and every query
//! goes back to ipset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cmd_abstraction::CommandExecutor;
use crate::error::{IpsetError, Result};
use crate::manager::{RefreshSummary, SetManager};
use crate::output::SetHeader;

/// Set types handled by this crate must start with this prefix.
pub const HASH_TYPE_PREFIX: &str = "hash:";

pub const DEFAULT_HASH_SIZE: u32 = 1024;
pub const DEFAULT_MAX_ELEM: u32 = 65536;

/// Suffix of the scratch set used while refreshing.
pub const TEMP_SUFFIX: &str = "-temp";

/// Address family of a set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    #[default]
    Inet,
    Inet6,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Inet => "inet",
            Family::Inet6 => "inet6",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "inet" => Ok(Family::Inet),
            "inet6" => Ok(Family::Inet6),
            other => Err(format!("unknown family '{}' (expected inet or inet6)", other)),
        }
    }
}

/// Optional creation parameters. Unset fields fall back to ipset's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetParams {
    pub family: Option<Family>,
    pub hash_size: Option<u32>,
    pub max_elem: Option<u32>,
    /// Default entry timeout in seconds; 0 stores entries permanently.
    pub timeout: u32,
    /// Pass `-exist` so creating an already existing set is not an error.
    pub exist: bool,
}

impl SetParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn family(mut self, family: Family) -> Self {
        self.family = Some(family);
        self
    }

    pub fn hash_size(mut self, hash_size: u32) -> Self {
        self.hash_size = Some(hash_size);
        self
    }

    pub fn max_elem(mut self, max_elem: u32) -> Self {
        self.max_elem = Some(max_elem);
        self
    }

    pub fn timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn exist(mut self, exist: bool) -> Self {
        self.exist = exist;
        self
    }
}

/// Resolved metadata of a hash set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetInfo {
    pub name: String,
    pub hash_type: String,
    pub family: Family,
    pub hash_size: u32,
    pub max_elem: u32,
    pub timeout: u32,
    /// Extra create options read back from an existing set, e.g. `counters`.
    pub options: Vec<String>,
}

impl SetInfo {
    /// Apply defaults and check that `hash_type` is a hash type.
    pub fn resolve(name: &str, hash_type: &str, params: &SetParams) -> Result<Self> {
        if !hash_type.starts_with(HASH_TYPE_PREFIX) {
            return Err(IpsetError::InvalidArgument(format!(
                "not a hash type: {}",
                hash_type
            )));
        }

        Ok(Self {
            name: name.to_string(),
            hash_type: hash_type.to_string(),
            family: params.family.unwrap_or_default(),
            hash_size: params.hash_size.unwrap_or(DEFAULT_HASH_SIZE),
            max_elem: params.max_elem.unwrap_or(DEFAULT_MAX_ELEM),
            timeout: params.timeout,
            options: Vec::new(),
        })
    }

    /// Rebuild metadata from the header of `ipset list <name>`, extension
    /// options included so a re-created copy keeps them.
    pub fn from_header(name: &str, header: &SetHeader) -> Result<Self> {
        let hash_type = header.set_type.as_deref().unwrap_or_default();
        let family = match header.family.as_deref() {
            Some(f) => f.parse().map_err(IpsetError::InvalidArgument)?,
            None => Family::default(),
        };
        let params = SetParams {
            family: Some(family),
            hash_size: header.hash_size,
            max_elem: header.max_elem,
            timeout: header.timeout.unwrap_or(0),
            exist: false,
        };
        let mut info = Self::resolve(name, hash_type, &params)?;
        info.options = header.options.clone();
        Ok(info)
    }

    /// Name of the scratch set used by refresh.
    pub fn temp_name(&self) -> String {
        format!("{}{}", self.name, TEMP_SUFFIX)
    }

    /// Arguments for `ipset create` of a set called `name` with these parameters.
    pub fn create_args(&self, name: &str, exist: bool) -> Vec<String> {
        let mut args = vec![
            "create".to_string(),
            name.to_string(),
            self.hash_type.clone(),
            "family".to_string(),
            self.family.to_string(),
            "hashsize".to_string(),
            self.hash_size.to_string(),
            "maxelem".to_string(),
            self.max_elem.to_string(),
            "timeout".to_string(),
            self.timeout.to_string(),
        ];
        args.extend(self.options.iter().cloned());
        if exist {
            args.push("-exist".to_string());
        }
        args
    }
}

/// Handle to a set created through a [`SetManager`].
///
/// Dropping the handle leaves the set in place; [`IpSet::destroy`] removes it.
pub struct IpSet<'m, E: CommandExecutor> {
    manager: &'m SetManager<E>,
    info: SetInfo,
}

impl<'m, E: CommandExecutor> IpSet<'m, E> {
    pub(crate) fn new(manager: &'m SetManager<E>, info: SetInfo) -> Self {
        Self { manager, info }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn info(&self) -> &SetInfo {
        &self.info
    }

    /// Add `entry`; a timeout of 0 stores it permanently.
    pub fn add(&self, entry: &str, timeout: u32) -> Result<()> {
        self.manager.add(&self.info.name, entry, timeout)
    }

    /// Add `entry` with an extra option such as `nomatch`.
    pub fn add_option(&self, entry: &str, option: &str, timeout: u32) -> Result<()> {
        self.manager.add_option(&self.info.name, entry, option, timeout)
    }

    pub fn del(&self, entry: &str) -> Result<()> {
        self.manager.del(&self.info.name, entry)
    }

    pub fn test(&self, entry: &str) -> Result<bool> {
        self.manager.test(&self.info.name, entry)
    }

    pub fn flush(&self) -> Result<()> {
        self.manager.flush(&self.info.name)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        self.manager.list(&self.info.name)
    }

    /// Replace the whole membership via a temporary set and an atomic swap.
    pub fn refresh<S: AsRef<str>>(&self, entries: &[S]) -> Result<RefreshSummary> {
        self.manager.refresh(&self.info, entries)
    }

    pub fn destroy(self) -> Result<()> {
        self.manager.destroy(&self.info.name)
    }
}

impl<E: CommandExecutor> fmt::Debug for IpSet<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IpSet").field("info", &self.info).finish()
    }
}
