//! Apply command: bring every set of a sets file to its declared membership.

use anyhow::Result;
use std::path::Path;
use tracing::{error, info};

use super::open_or_create;
use super::refresh::report;
use crate::cmd_abstraction::CommandExecutor;
use crate::config::{SetDefinition, SetsConfig};
use crate::lock::SetLock;
use crate::manager::SetManager;

/// Run the apply command
///
/// Every set is attempted even if an earlier one fails; the command fails if
/// any set failed.
pub fn run<E: CommandExecutor>(manager: &SetManager<E>, file: &Path, lock_dir: &Path) -> Result<()> {
    let config = SetsConfig::load(file)?;
    info!("Applying {} sets from {:?}", config.sets.len(), file);

    let mut failed = Vec::new();
    for def in &config.sets {
        if let Err(e) = apply_set(manager, def, lock_dir) {
            error!("Failed to apply set {}: {:#}", def.name, e);
            failed.push(def.name.as_str());
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Failed to apply sets: {}", failed.join(", "));
    }
    Ok(())
}

fn apply_set<E: CommandExecutor>(manager: &SetManager<E>, def: &SetDefinition, lock_dir: &Path) -> Result<()> {
    let entries = def.resolve_entries()?;
    let _lock = SetLock::acquire(lock_dir, &def.name)?;

    let set = open_or_create(manager, &def.name, Some((def.set_type.as_str(), def.params())))?;
    let summary = set.refresh(&entries)?;
    report(&def.name, &summary);
    Ok(())
}
