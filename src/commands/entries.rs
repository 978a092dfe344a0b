//! Single-entry commands: add, del, test.

use anyhow::Result;

use crate::cmd_abstraction::CommandExecutor;
use crate::manager::SetManager;

pub fn add<E: CommandExecutor>(
    manager: &SetManager<E>,
    name: &str,
    entry: &str,
    timeout: u32,
    option: Option<&str>,
) -> Result<()> {
    match option {
        Some(option) => manager.add_option(name, entry, option, timeout)?,
        None => manager.add(name, entry, timeout)?,
    }
    println!("[OK] Added {} to {}", entry, name);
    Ok(())
}

pub fn del<E: CommandExecutor>(manager: &SetManager<E>, name: &str, entry: &str) -> Result<()> {
    manager.del(name, entry)?;
    println!("[OK] Removed {} from {}", entry, name);
    Ok(())
}

/// Returns whether the entry is present.
pub fn test<E: CommandExecutor>(manager: &SetManager<E>, name: &str, entry: &str) -> Result<bool> {
    let present = manager.test(name, entry)?;
    if present {
        println!("{} is in set {}", entry, name);
    } else {
        println!("{} is NOT in set {}", entry, name);
    }
    Ok(present)
}
