//! CLI argument parsing with clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::lock::DEFAULT_LOCK_DIR;
use crate::set::{Family, SetParams};

#[derive(Parser)]
#[command(name = "ipsetctl")]
#[command(author, version, about = "Manage ipset hash sets with atomic refresh")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output, shows every ipset invocation)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for per-set refresh lock files
    #[arg(long, default_value = DEFAULT_LOCK_DIR, global = true)]
    pub lock_dir: PathBuf,
}

/// Creation parameters shared by `create` and `refresh --type`.
#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Address family (inet, inet6)
    #[arg(long, default_value = "inet")]
    pub family: Family,

    /// Initial hash size
    #[arg(long)]
    pub hashsize: Option<u32>,

    /// Maximum number of elements
    #[arg(long)]
    pub maxelem: Option<u32>,

    /// Default entry timeout in seconds (0 = permanent)
    #[arg(long, default_value = "0")]
    pub timeout: u32,
}

impl CreateArgs {
    pub fn to_params(&self, exist: bool) -> SetParams {
        SetParams {
            family: Some(self.family),
            hash_size: self.hashsize,
            max_elem: self.maxelem,
            timeout: self.timeout,
            exist,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a hash set (and flush it)
    Create {
        /// Set name
        name: String,
        /// Set type, e.g. hash:ip, hash:net, hash:ip,port
        #[arg(value_name = "TYPE")]
        set_type: String,
        #[command(flatten)]
        params: CreateArgs,
        /// Do not fail if the set already exists
        #[arg(long)]
        exist: bool,
    },

    /// Add an entry to a set
    Add {
        name: String,
        entry: String,
        /// Entry timeout in seconds (0 = permanent)
        #[arg(long, default_value = "0")]
        timeout: u32,
        /// Extra entry option, e.g. nomatch
        #[arg(long)]
        option: Option<String>,
    },

    /// Delete an entry from a set (no error if absent)
    Del { name: String, entry: String },

    /// Test whether an entry is in a set (exit code 1 if absent)
    Test { name: String, entry: String },

    /// Remove all entries from a set
    Flush {
        /// Set name (omit with --all)
        #[arg(required_unless_present = "all")]
        name: Option<String>,
        /// Flush every set
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },

    /// List the members of a set
    List { name: String },

    /// List the names of all sets
    Names,

    /// Destroy a set
    Destroy {
        /// Set name (omit with --all)
        #[arg(required_unless_present = "all")]
        name: Option<String>,
        /// Destroy every set
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },

    /// Swap two sets of the same type
    Swap { from: String, to: String },

    /// Atomically replace the members of a set
    Refresh {
        name: String,
        /// Entries to load
        entries: Vec<String>,
        /// Read entries from a file (one per line, '#' comments)
        #[arg(long, short)]
        file: Option<PathBuf>,
        /// Create the set with this type if it does not exist yet
        #[arg(long = "type", value_name = "TYPE")]
        set_type: Option<String>,
        #[command(flatten)]
        params: CreateArgs,
    },

    /// Create and refresh every set declared in a YAML file
    Apply {
        /// Path to the sets file
        file: PathBuf,
    },

    /// Show ipsetctl and ipset versions
    Version,
}
