//! Tracing subscriber setup.
//!
//! Logs go to stderr so reports on stdout can be piped or redirected cleanly.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at `info`, or `debug`
/// with `verbose`. Calling this more than once is a no-op.
pub fn init(verbose: bool) {
    let default = if verbose {
        "kappa_curves=debug"
    } else {
        "kappa_curves=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
