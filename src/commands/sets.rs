//! Set lifecycle commands: create, flush, destroy, swap.

use anyhow::Result;

use crate::cli::CreateArgs;
use crate::cmd_abstraction::CommandExecutor;
use crate::manager::SetManager;

pub fn create<E: CommandExecutor>(
    manager: &SetManager<E>,
    name: &str,
    set_type: &str,
    params: &CreateArgs,
    exist: bool,
) -> Result<()> {
    let set = manager.create(name, set_type, params.to_params(exist))?;
    let info = set.info();
    println!(
        "[OK] Created set {} ({} family {} hashsize {} maxelem {} timeout {})",
        info.name, info.hash_type, info.family, info.hash_size, info.max_elem, info.timeout
    );
    Ok(())
}

pub fn flush<E: CommandExecutor>(manager: &SetManager<E>, name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => {
            manager.flush(name)?;
            println!("[OK] Flushed set {}", name);
        }
        None => {
            manager.flush_all()?;
            println!("[OK] Flushed all sets");
        }
    }
    Ok(())
}

pub fn destroy<E: CommandExecutor>(manager: &SetManager<E>, name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => {
            manager.destroy(name)?;
            println!("[OK] Destroyed set {}", name);
        }
        None => {
            manager.destroy_all()?;
            println!("[OK] Destroyed all sets");
        }
    }
    Ok(())
}

pub fn swap<E: CommandExecutor>(manager: &SetManager<E>, from: &str, to: &str) -> Result<()> {
    manager.swap(from, to)?;
    println!("[OK] Swapped {} and {}", from, to);
    Ok(())
}
