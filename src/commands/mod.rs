//! CLI command implementations.

pub mod apply;
pub mod entries;
pub mod list;
pub mod refresh;
pub mod sets;
pub mod version;

use anyhow::Result;

use crate::cmd_abstraction::CommandExecutor;
use crate::manager::SetManager;
use crate::set::{IpSet, SetInfo, SetParams};

/// Warn when not running as root (effective UID != 0).
///
/// ipset needs CAP_NET_ADMIN; a capability-only setup may still work, so this
/// does not abort.
pub fn warn_if_not_root() {
    // SAFETY: geteuid() has no preconditions and never fails.
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        tracing::warn!(
            "Not running as root: ipset commands will fail unless the process has CAP_NET_ADMIN"
        );
    }
}

/// Handle to `name`, creating it with `create` when it does not exist yet.
///
/// An existing set is opened, never re-created: create always flushes, which
/// would empty a live set. Its type and family must match the requested ones.
pub(crate) fn open_or_create<'m, E: CommandExecutor>(
    manager: &'m SetManager<E>,
    name: &str,
    create: Option<(&str, SetParams)>,
) -> Result<IpSet<'m, E>> {
    let exists = manager.names()?.iter().any(|n| n == name);

    match (exists, create) {
        (true, Some((set_type, params))) => {
            let set = manager.open(name)?;
            let info = set.info();
            if info.hash_type != set_type {
                anyhow::bail!(
                    "Set '{}' already exists with type {} (requested {})",
                    name,
                    info.hash_type,
                    set_type
                );
            }
            let family = params.family.unwrap_or_default();
            if info.family != family {
                anyhow::bail!(
                    "Set '{}' already exists with family {} (requested {})",
                    name,
                    info.family,
                    family
                );
            }
            warn_on_param_drift(info, &params);
            Ok(set)
        }
        (true, None) => Ok(manager.open(name)?),
        (false, Some((set_type, params))) => {
            let set = manager.create(name, set_type, params)?;
            println!("[OK] Created set {} ({})", name, set_type);
            Ok(set)
        }
        (false, None) => anyhow::bail!(
            "Set '{}' does not exist; pass --type to create it",
            name
        ),
    }
}

/// Sizing and timeout of an existing set are kept as they are; ipset may
/// also round hashsize on its own, so a difference is only reported.
fn warn_on_param_drift(info: &SetInfo, params: &SetParams) {
    let requested = [
        ("hashsize", params.hash_size, info.hash_size),
        ("maxelem", params.max_elem, info.max_elem),
        ("timeout", Some(params.timeout), info.timeout),
    ];
    for (param, wanted, live) in requested {
        if let Some(wanted) = wanted.filter(|w| *w != live) {
            tracing::warn!(
                "Set '{}' keeps {} {} (requested {}); destroy it to re-create",
                info.name,
                param,
                live,
                wanted
            );
        }
    }
}
