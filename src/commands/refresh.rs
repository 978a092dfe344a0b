//! Refresh command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

use super::open_or_create;
use crate::cli::CreateArgs;
use crate::cmd_abstraction::CommandExecutor;
use crate::config::{parse_entries, validate_set_name};
use crate::lock::SetLock;
use crate::manager::{RefreshSummary, SetManager};

/// Options of `ipsetctl refresh`.
pub struct RefreshOptions<'a> {
    pub name: &'a str,
    pub entries: Vec<String>,
    pub file: Option<&'a Path>,
    pub set_type: Option<&'a str>,
    pub params: &'a CreateArgs,
    pub lock_dir: &'a Path,
}

/// Run the refresh command
pub fn run<E: CommandExecutor>(manager: &SetManager<E>, opts: RefreshOptions<'_>) -> Result<RefreshSummary> {
    validate_set_name(opts.name)?;

    let mut entries = opts.entries;
    if let Some(file) = opts.file {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read entries file: {:?}", file))?;
        entries.extend(parse_entries(&content));
    }

    let _lock = SetLock::acquire(opts.lock_dir, opts.name)?;

    let create = opts.set_type.map(|t| (t, opts.params.to_params(false)));
    let set = open_or_create(manager, opts.name, create)?;
    let summary = set.refresh(&entries)?;
    report(opts.name, &summary);

    Ok(summary)
}

pub(crate) fn report(name: &str, summary: &RefreshSummary) {
    if summary.is_complete() {
        println!("[OK] Refreshed {} with {} entries", name, summary.loaded);
    } else {
        warn!(
            "Set {} is live with {} of {} entries; rejected: {}",
            name,
            summary.loaded,
            summary.requested,
            summary.rejected.join(", ")
        );
        println!(
            "[WARN] Refreshed {} with {}/{} entries ({} rejected)",
            name,
            summary.loaded,
            summary.requested,
            summary.rejected.len()
        );
    }
}
