//! ipsetctl - ipset hash set manager
//!
//! Thin CLI over the `ipsetctl` library: every subcommand maps onto one
//! SetManager operation, plus `refresh` and `apply` for atomic reloads.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ipsetctl::cli::{Cli, Commands};
use ipsetctl::commands::{self, apply, entries, list, refresh, sets, version};
use ipsetctl::SetManager;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Version works without a usable ipset
    if let Commands::Version = cli.command {
        version::run();
        return Ok(());
    }

    commands::warn_if_not_root();
    let manager = SetManager::init()?;

    match cli.command {
        Commands::Create {
            name,
            set_type,
            params,
            exist,
        } => sets::create(&manager, &name, &set_type, &params, exist),
        Commands::Add {
            name,
            entry,
            timeout,
            option,
        } => entries::add(&manager, &name, &entry, timeout, option.as_deref()),
        Commands::Del { name, entry } => entries::del(&manager, &name, &entry),
        Commands::Test { name, entry } => {
            if !entries::test(&manager, &name, &entry)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Flush { name, .. } => sets::flush(&manager, name.as_deref()),
        Commands::List { name } => list::members(&manager, &name),
        Commands::Names => list::names(&manager),
        Commands::Destroy { name, .. } => sets::destroy(&manager, name.as_deref()),
        Commands::Swap { from, to } => sets::swap(&manager, &from, &to),
        Commands::Refresh {
            name,
            entries,
            file,
            set_type,
            params,
        } => refresh::run(
            &manager,
            refresh::RefreshOptions {
                name: &name,
                entries,
                file: file.as_deref(),
                set_type: set_type.as_deref(),
                params: &params,
                lock_dir: &cli.lock_dir,
            },
        )
        .map(|_| ()),
        Commands::Apply { file } => apply::run(&manager, &file, &cli.lock_dir),
        Commands::Version => Ok(()),
    }
}
