//! Logging setup for the `bmitrack` binary.
//!
//! `bmitrack` prints its results on stdout, and `history --json` output is
//! meant to be piped into other tools. Diagnostics therefore always go to
//! stderr, and the default level is quiet enough that a normal run logs
//! nothing. Rejected input is reported by the CLI itself and is not
//! logged as a fault. Storage failures are logged at `error`.
//!
//! Useful filters:
//! - `RUST_LOG=bmi_core=debug` shows every assessment and each store
//!   append and history load
//! - `RUST_LOG=info` adds config loading, store open and user creation

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_LEVEL: &str = "warn";

/// Install the subscriber for the CLI
///
/// Call once, before the first command runs.
pub fn init() {
    init_with_level(DEFAULT_LEVEL)
}

/// Install the subscriber with a different fallback level
///
/// `RUST_LOG` still wins when set. Events use the compact format on
/// stderr, keeping stdout free for command output.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route events to the test harness at debug level
///
/// Safe to call from every test; only the first call installs.
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
