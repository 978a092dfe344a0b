//! Listing commands.

use anyhow::Result;

use crate::cmd_abstraction::CommandExecutor;
use crate::manager::SetManager;

pub fn members<E: CommandExecutor>(manager: &SetManager<E>, name: &str) -> Result<()> {
    for member in manager.list(name)? {
        println!("{}", member);
    }
    Ok(())
}

pub fn names<E: CommandExecutor>(manager: &SetManager<E>) -> Result<()> {
    for name in manager.names()? {
        println!("{}", name);
    }
    Ok(())
}
