#![cfg(not(target_arch = "wasm32"))]

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger for the native binary.
///
/// `verbose` lowers the default filter to debug; `RUST_LOG` still overrides it.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    // A second init (tests, repeated runs) is not an error.
    let _ = Builder::from_env(env).try_init();
}
