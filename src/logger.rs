//! Logging setup. `RUST_LOG` takes precedence over the verbosity flag.

use env_logger::Env;

/// Initializes the global logger: `debug` with `verbose`, `info` otherwise.
pub fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_target(verbose)
        .format_timestamp(None)
        .init();
}
