//! Version command implementation.

use crate::manager::SetManager;

/// Print our version and, if available, the ipset version.
///
/// Never fails: a missing or unsupported ipset is reported, not returned.
pub fn run() {
    println!("ipsetctl {}", env!("CARGO_PKG_VERSION"));

    match SetManager::init() {
        Ok(manager) => match manager.version() {
            Some(v) => println!("ipset {} ({})", v, manager.ipset_path().display()),
            None => println!(
                "ipset version unknown ({})",
                manager.ipset_path().display()
            ),
        },
        Err(e) => println!("ipset: {}", e),
    }
}
