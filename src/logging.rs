//! Logger setup for hosts and the `strider-sim` binary.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Level applied to this crate's targets.
#[must_use]
pub const fn crate_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs `env_logger` as the global logger.
///
/// Other crates log at `warn`; `strider` targets log at [`crate_level`].
/// `RUST_LOG` replaces both. Returns `false` when a logger was already
/// installed, in which case nothing changes.
#[must_use]
pub fn init(verbose: bool) -> bool {
    let filter = format!("warn,strider={}", crate_level(verbose));
    Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
