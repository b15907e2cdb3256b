//! Diagnostic logging (§9 Logging), gated by the resolved verbosity level.
//! Separate from the direct-to-stdout report lines in `report.rs`.

use tracing_subscriber::EnvFilter;

/// Maps the resolved verbosity (`0` = quiet) onto a `tracing` max level and
/// installs a global subscriber. Called once, from rank 0's `main` only is
/// *not* required — every rank logs independently, since diagnostics (unlike
/// report lines) are per-worker.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "off",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
