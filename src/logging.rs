//! Opt-in `tracing` subscriber setup.
//!
//! The library only emits events (targets `ironframe::format`,
//! `ironframe::dataset`, `ironframe::io`). Applications that already install
//! a subscriber need none of this.

use std::sync::{Once, OnceLock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const DEFAULT_DIRECTIVE: &str = "ironframe=info";

/// Install a stderr fmt subscriber filtered by `RUST_LOG`
/// (default `ironframe=info`). Later calls return the first call's outcome.
///
/// # Errors
/// Fails when `RUST_LOG` does not parse or a foreign global subscriber is
/// already installed.
pub fn init() -> anyhow::Result<()> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();

    INIT.get_or_init(install)
        .clone()
        .map_err(anyhow::Error::msg)?;
    tracing::debug!(target: "ironframe", "logging initialized");
    Ok(())
}

fn install() -> Result<(), String> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(spec),
        _ => EnvFilter::try_new(DEFAULT_DIRECTIVE),
    }
    .map_err(|e| e.to_string())?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .try_init()
        .map_err(|e| e.to_string())
}

/// Route events into the test harness's captured output. Safe to call from
/// every test.
pub fn init_for_tests() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("ironframe=debug"));
        // A subscriber installed by the host test binary wins.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
