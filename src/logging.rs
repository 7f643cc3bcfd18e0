//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence. Without it, this crate logs at `info`
//! (`debug` when verbose) and dependencies stay at `warn`. Output goes to
//! stderr so JSON printed by the CLI on stdout stays clean.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "warn,ufc_rankings=debug,rankings_core=debug"
    } else {
        "warn,ufc_rankings=info,rankings_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
