//! The set manager: one method per ipset command plus the refresh protocol.
//!
//! Every method blocks the calling thread for the lifetime of one ipset
//! process (refresh runs several in sequence). There is no retry anywhere.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error, info};

use crate::binary::{self, IpsetVersion};
use crate::cmd_abstraction::{args_to_strings, CommandExecutor, CommandOutput, RealCommandExecutor};
use crate::error::{IpsetError, Operation, ProcessFailure, Result};
use crate::output::{self, TestOutcome};
use crate::set::{IpSet, SetInfo, SetParams};

/// Error target used by commands that apply to every set.
const ALL_SETS: &str = "all sets";

/// Outcome of a successful [`SetManager::refresh`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Number of entries passed in.
    pub requested: usize,
    /// Number of entries ipset accepted into the new set.
    pub loaded: usize,
    /// Entries ipset refused; these are missing from the now-live set.
    pub rejected: Vec<String>,
}

impl RefreshSummary {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Handle on the ipset utility.
///
/// Obtained from [`SetManager::init`], which runs the capability gate once.
/// The resolved executable path is kept for the lifetime of the manager.
pub struct SetManager<E: CommandExecutor = RealCommandExecutor> {
    executor: E,
    ipset: PathBuf,
    program: String,
    version: Option<IpsetVersion>,
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SetManager<RealCommandExecutor> {
    /// Locate ipset on `PATH` and check its version.
    ///
    /// Fails with [`IpsetError::ExecutableNotFound`] or
    /// [`IpsetError::UnsupportedVersion`]; both mean the manager is unusable.
    pub fn init() -> Result<Self> {
        let ipset = binary::locate()?;
        Self::with_executor(RealCommandExecutor::new(), ipset)
    }
}

impl<E: CommandExecutor> SetManager<E> {
    /// Run the version gate against `ipset` through `executor`.
    pub fn with_executor(executor: E, ipset: impl Into<PathBuf>) -> Result<Self> {
        let ipset = ipset.into();
        let version = binary::check_version(&executor, &ipset)?;
        Ok(Self {
            program: ipset.to_string_lossy().into_owned(),
            executor,
            ipset,
            version,
            refresh_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn ipset_path(&self) -> &Path {
        &self.ipset
    }

    /// Version detected at init, `None` if detection was inconclusive.
    pub fn version(&self) -> Option<IpsetVersion> {
        self.version
    }

    /// Ask ipset for its version again.
    pub fn query_version(&self) -> Result<IpsetVersion> {
        binary::query_version(&self.executor, &self.ipset)
    }

    /// Create a hash set and flush it.
    ///
    /// The flush guarantees the set starts empty even when `params.exist`
    /// re-used a set of the same name.
    pub fn create(&self, name: &str, hash_type: &str, params: SetParams) -> Result<IpSet<'_, E>> {
        let info = SetInfo::resolve(name, hash_type, &params)?;
        self.create_hash_set(&info, name, params.exist)?;
        Ok(IpSet::new(self, info))
    }

    /// Handle to an existing set, with its parameters read back from ipset.
    pub fn open(&self, name: &str) -> Result<IpSet<'_, E>> {
        let info = self.describe(name)?;
        Ok(IpSet::new(self, info))
    }

    /// Read the creation parameters of an existing set.
    ///
    /// Uses the terse listing, so members are not transferred.
    pub fn describe(&self, name: &str) -> Result<SetInfo> {
        let out = self.run(Operation::List, name, &["-t", "list", name])?;
        let header = output::header(&out.combined()).ok_or_else(|| {
            IpsetError::InvalidArgument(format!("no set header in ipset output for {}", name))
        })?;
        SetInfo::from_header(name, &header)
    }

    /// Names of all sets.
    pub fn names(&self) -> Result<Vec<String>> {
        let out = self.run(Operation::Names, ALL_SETS, &["-n", "list"])?;
        Ok(output::names(&out.combined()))
    }

    /// Member lines of `name`, without the header block.
    pub fn list(&self, name: &str) -> Result<Vec<String>> {
        let out = self.run(Operation::List, name, &["list", name])?;
        Ok(output::members(&out.combined()))
    }

    /// Whether `entry` is in `name`.
    ///
    /// Absent entries are `Ok(false)`; any other failure is an error.
    pub fn test(&self, name: &str, entry: &str) -> Result<bool> {
        let target = format!("{} {}", name, entry);
        let out = self.exec(Operation::Test, &target, &["test", name, entry])?;
        let combined = out.combined();
        match output::test_outcome(&combined, out.success) {
            TestOutcome::Present => Ok(true),
            TestOutcome::Absent => Ok(false),
            TestOutcome::Failed => Err(IpsetError::command_failed(
                Operation::Test,
                target,
                ProcessFailure::Exit { code: out.code },
                combined,
            )),
        }
    }

    /// Add `entry` to `name`. A timeout of 0 stores the entry permanently.
    pub fn add(&self, name: &str, entry: &str, timeout: u32) -> Result<()> {
        let timeout = timeout.to_string();
        self.run(
            Operation::Add,
            &format!("{} {}", name, entry),
            &["add", name, entry, "timeout", &timeout, "-exist"],
        )?;
        Ok(())
    }

    /// Add `entry` with an extra option (e.g. `nomatch`).
    pub fn add_option(&self, name: &str, entry: &str, option: &str, timeout: u32) -> Result<()> {
        let timeout = timeout.to_string();
        self.run(
            Operation::Add,
            &format!("{} {} {}", name, entry, option),
            &["add", name, entry, option, "timeout", &timeout, "-exist"],
        )?;
        Ok(())
    }

    /// Delete `entry` from `name`; deleting a missing entry is not an error.
    pub fn del(&self, name: &str, entry: &str) -> Result<()> {
        self.run(
            Operation::Del,
            &format!("{} {}", name, entry),
            &["del", name, entry, "-exist"],
        )?;
        Ok(())
    }

    pub fn flush(&self, name: &str) -> Result<()> {
        self.run(Operation::Flush, name, &["flush", name])?;
        Ok(())
    }

    /// Flush every set.
    pub fn flush_all(&self) -> Result<()> {
        self.run(Operation::Flush, ALL_SETS, &["flush"])?;
        Ok(())
    }

    pub fn destroy(&self, name: &str) -> Result<()> {
        self.run(Operation::Destroy, name, &["destroy", name])?;
        Ok(())
    }

    /// Destroy every set known to ipset. There is no confirmation.
    pub fn destroy_all(&self) -> Result<()> {
        self.run(Operation::Destroy, ALL_SETS, &["destroy"])?;
        Ok(())
    }

    /// Exchange the names of two existing, type-compatible sets.
    pub fn swap(&self, from: &str, to: &str) -> Result<()> {
        self.run(Operation::Swap, &format!("{} {}", from, to), &["swap", from, to])?;
        Ok(())
    }

    /// Replace the membership of `set` with `entries`.
    ///
    /// 1. create `<name>-temp` with the same parameters (re-create allowed), flushed
    /// 2. add every entry to it; individual failures are logged and skipped
    /// 3. swap the temporary and the live set
    /// 4. destroy the temporary name, which now holds the old members
    ///
    /// Observers of `set.name` see either the old or the new membership, never
    /// an empty or half-loaded set. If step 3 fails the live set is unchanged
    /// and the populated temporary set is left behind for the next refresh.
    ///
    /// Refreshes of the same name through this manager are serialized.
    /// Other processes are not coordinated with.
    pub fn refresh<S: AsRef<str>>(&self, set: &SetInfo, entries: &[S]) -> Result<RefreshSummary> {
        let lock = self.refresh_lock(&set.name);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let temp = set.temp_name();
        self.create_hash_set(set, &temp, true)?;

        let mut summary = RefreshSummary {
            requested: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            let entry = entry.as_ref();
            match self.run(
                Operation::Add,
                &format!("{} {}", temp, entry),
                &["add", &temp, entry, "-exist"],
            ) {
                Ok(_) => summary.loaded += 1,
                Err(e) => {
                    error!("Error adding entry {} to set {}: {}", entry, temp, e);
                    summary.rejected.push(entry.to_string());
                }
            }
        }

        self.swap(&temp, &set.name)?;
        self.destroy(&temp)?;

        info!(
            "Refreshed set {} with {}/{} entries",
            set.name, summary.loaded, summary.requested
        );
        Ok(summary)
    }

    fn create_hash_set(&self, info: &SetInfo, name: &str, exist: bool) -> Result<()> {
        let args = info.create_args(name, exist);
        let out = self.exec_args(Operation::Create, name, args)?;
        if !out.success {
            return Err(IpsetError::command_failed(
                Operation::Create,
                format!("{} with type {}", name, info.hash_type),
                ProcessFailure::Exit { code: out.code },
                out.combined(),
            ));
        }
        self.flush(name)
    }

    fn refresh_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .refresh_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(name.to_string()).or_default().clone()
    }

    /// Run a command and turn a non-zero exit into [`IpsetError::CommandFailed`].
    fn run(&self, operation: Operation, target: &str, args: &[&str]) -> Result<CommandOutput> {
        let out = self.exec(operation, target, args)?;
        if !out.success {
            return Err(IpsetError::command_failed(
                operation,
                target,
                ProcessFailure::Exit { code: out.code },
                out.combined(),
            ));
        }
        Ok(out)
    }

    fn exec(&self, operation: Operation, target: &str, args: &[&str]) -> Result<CommandOutput> {
        self.exec_args(operation, target, args_to_strings(args))
    }

    fn exec_args(&self, operation: Operation, target: &str, args: Vec<String>) -> Result<CommandOutput> {
        debug!("Executing: {} {}", self.program, args.join(" "));
        self.executor
            .execute(&self.program, &args)
            .map_err(|e| IpsetError::command_failed(operation, target, ProcessFailure::Spawn(e), ""))
    }
}
