//! Declarative set files for `ipsetctl apply`.
//!
//! ```yaml
//! sets:
//!   - name: blocklist
//!     type: hash:ip
//!     family: inet
//!     entries: [10.0.0.2, 10.0.0.3]
//!     entries_file: /etc/ipsetctl/blocklist.txt
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::set::{Family, SetParams, HASH_TYPE_PREFIX, TEMP_SUFFIX};

/// ipset rejects names longer than this.
pub const MAX_SET_NAME_LEN: usize = 31;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SetsConfig {
    pub sets: Vec<SetDefinition>,
}

/// One managed set and its desired membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetDefinition {
    pub name: String,

    /// Set type, e.g. "hash:ip" or "hash:net"
    #[serde(rename = "type")]
    pub set_type: String,

    #[serde(default)]
    pub family: Family,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashsize: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxelem: Option<u32>,

    /// Default entry timeout in seconds (0 = permanent)
    #[serde(default)]
    pub timeout: u32,

    #[serde(default)]
    pub entries: Vec<String>,

    /// File with one entry per line; '#' starts a comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries_file: Option<PathBuf>,
}

impl SetsConfig {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read sets file: {:?}", path.as_ref()))?;
        let config: SetsConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse sets file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for set in &self.sets {
            validate_set_name(&set.name)?;

            if !seen.insert(set.name.as_str()) {
                anyhow::bail!("Set '{}' is defined more than once", set.name);
            }

            if !set.set_type.starts_with(HASH_TYPE_PREFIX) {
                anyhow::bail!(
                    "Set '{}' has type '{}'; only {}* types are supported",
                    set.name,
                    set.set_type,
                    HASH_TYPE_PREFIX
                );
            }
        }

        Ok(())
    }
}

impl SetDefinition {
    pub fn params(&self) -> SetParams {
        SetParams {
            family: Some(self.family),
            hash_size: self.hashsize,
            max_elem: self.maxelem,
            timeout: self.timeout,
            exist: true,
        }
    }

    /// Inline entries followed by those from `entries_file`, duplicates removed.
    pub fn resolve_entries(&self) -> Result<Vec<String>> {
        let mut entries = self.entries.clone();

        if let Some(ref path) = self.entries_file {
            let content = std::fs::read_to_string(path).with_context(|| {
                format!("Failed to read entries file for set '{}': {:?}", self.name, path)
            })?;
            entries.extend(parse_entries(&content));
        }

        let mut seen = HashSet::new();
        entries.retain(|e| seen.insert(e.clone()));
        Ok(entries)
    }
}

/// Set names must leave room for the refresh suffix within ipset's limit.
pub fn validate_set_name(name: &str) -> Result<()> {
    let max = MAX_SET_NAME_LEN - TEMP_SUFFIX.len();
    if name.is_empty() || name.len() > max {
        anyhow::bail!("Set name '{}' must be 1 to {} characters long", name, max);
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        anyhow::bail!("Set name '{}' contains whitespace or control characters", name);
    }
    Ok(())
}

/// Parse one entry per line, ignoring blank lines and '#' comments.
pub fn parse_entries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
