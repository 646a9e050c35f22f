//! Tracing setup
//!
//! The client only emits `tracing` events. Applications that do not install
//! their own subscriber can call [`init_tracing`] once at startup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Directive used when `debug` is set and `RUST_LOG` is not
pub const DEBUG_DIRECTIVE: &str = "kra_connect=debug";

/// Directive used when neither `debug` nor `RUST_LOG` is set
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Build the filter used by [`init_tracing`]
///
/// `RUST_LOG` always wins when it parses.
pub fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(debug)))
}

fn default_directive(debug: bool) -> &'static str {
    if debug {
        DEBUG_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    }
}

/// Install a global fmt subscriber
///
/// Returns `false` if a global subscriber was already set; the existing one
/// is left in place.
pub fn init_tracing(debug_enabled: bool) -> bool {
    let installed = tracing_subscriber::registry()
        .with(env_filter(debug_enabled))
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        log_initialized(debug_enabled);
    }
    installed
}

fn log_initialized(debug_enabled: bool) {
    tracing::debug!(event = "tracing_initialized", debug_enabled, "tracing subscriber installed");
}
