//! Tracing setup. A valid `RUST_LOG` overrides `logging.level`.
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Picks the filter for `level` unless `rust_log` holds valid directives.
///
/// Returns the filter and whether it came from `rust_log`.
fn resolve_filter(rust_log: Option<&str>, level: &str) -> (EnvFilter, bool) {
    match rust_log.map(EnvFilter::try_new) {
        Some(Ok(filter)) => (filter, true),
        _ => (EnvFilter::new(level), false),
    }
}

/// Installs the global subscriber at `info` before configuration is loaded.
pub fn init_tracing() {
    let rust_log = std::env::var("RUST_LOG").ok();
    let (filter, _) = resolve_filter(rust_log.as_deref(), "info");

    let (reload_layer, handle) = reload::Layer::new(filter);
    let _ = LOG_RELOAD_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init();
}

/// Switches to the configured `logging.level` once configuration is loaded.
pub fn apply_logging_level(level: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let (filter, from_env) = resolve_filter(rust_log.as_deref(), level);
    if from_env {
        return;
    }
    if let Some(handle) = LOG_RELOAD_HANDLE.get() {
        let _ = handle.modify(|f| *f = filter);
    }
}
