//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise wgpu/naga internals are kept at `warn`
//! so per-frame driver chatter does not drown the app's own events.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "info,wgpu_hal=warn,wgpu_core=warn,naga=warn";
const VERBOSE_FILTER: &str = "info,exposure_playground=debug,wgpu_hal=warn,wgpu_core=warn,naga=warn";

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(val) if !val.trim().is_empty() => EnvFilter::new(val),
        _ => EnvFilter::new(default_filter(verbose)),
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_filter_raises_crate_level_only() {
        assert!(default_filter(true).contains("exposure_playground=debug"));
        assert!(!default_filter(false).contains("debug"));
        assert!(default_filter(true).contains("wgpu_core=warn"));
    }
}
