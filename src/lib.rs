//! # ipsetctl - ipset hash set manager
//!
//! A synchronous wrapper around the `ipset` userspace utility for managing
//! kernel hash sets from Rust, with an atomic refresh that never exposes an
//! empty or half-loaded set to packet filtering rules.
//!
//! ## Features
//!
//! - **Version Gate** - ipset is located on `PATH` and must be 6.0 or newer
//! - **Typed Errors** - every failed invocation carries the operation, target and ipset output
//! - **Atomic Refresh** - load into `<name>-temp`, swap, destroy
//! - **No Cache** - membership is always read back from the kernel
//! - **Declarative Apply** - bring a YAML list of sets to their declared members
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ipsetctl                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: create, add, test, list, refresh, apply... │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml) + Lock (fs2)                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SetManager / IpSet                                         │
//! │    ├── one method per ipset command                         │
//! │    └── refresh protocol (temp set + swap)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Output parsing (regex)      Binary discovery + version     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CommandExecutor trait                                      │
//! │    └── RealCommandExecutor (std::process)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use ipsetctl::{SetManager, SetParams};
//!
//! fn main() -> anyhow::Result<()> {
//!     let manager = SetManager::init()?;
//!
//!     let set = manager.create("blocklist", "hash:ip", SetParams::new().exist(true))?;
//!     set.add("10.0.0.1", 0)?;
//!     assert!(set.test("10.0.0.1")?);
//!
//!     let summary = set.refresh(&["10.0.0.2", "10.0.0.3"])?;
//!     println!("{} entries loaded", summary.loaded);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`binary`] - Locating ipset and checking its version
//! - [`cli`] - Command-line interface definitions
//! - [`cmd_abstraction`] - Process execution seam (mockable in tests)
//! - [`commands`] - CLI command implementations
//! - [`config`] - Sets file parsing and validation
//! - [`error`] - Error types
//! - [`lock`] - Per-set file locking across processes
//! - [`manager`] - The set manager and the refresh protocol
//! - [`output`] - Parsing of ipset output
//! - [`set`] - Set metadata and handles

pub mod binary;
pub mod cli;
pub mod cmd_abstraction;
pub mod commands;
pub mod config;
pub mod error;
pub mod lock;
pub mod manager;
pub mod output;
pub mod set;

pub use binary::IpsetVersion;
pub use cmd_abstraction::{CommandExecutor, CommandOutput, RealCommandExecutor};
pub use error::{IpsetError, Operation, ProcessFailure, Result};
pub use manager::{RefreshSummary, SetManager};
pub use set::{Family, IpSet, SetInfo, SetParams};
