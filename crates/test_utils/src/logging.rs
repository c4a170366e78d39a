//! Test Logging Utilities
//!
//! Installs a tracing subscriber once per test binary so failing tests
//! print the spans and events captured while they ran. Controlled by
//! `RUST_LOG`, defaulting to `info`.

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init so a second subscriber in the same process is a no-op
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Initializes tracing for a test, at most once per process
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
