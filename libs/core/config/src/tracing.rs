use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset, keyed by environment.
const PRODUCTION_FILTER: &str = "info,tower_http=info,mongodb=warn";
const DEVELOPMENT_FILTER: &str = "debug,tower_http=debug,mongodb=info,hyper=info";

/// Install color-eyre for startup error reports.
///
/// Call this first thing in `main()`. Repeated calls are ignored.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize the global subscriber for the given environment.
///
/// - **Production**: flattened JSON events, no module targets.
/// - **Development**: pretty, multi-line output.
///
/// Both register [`tracing_error::ErrorLayer`] so that
/// [`tracing_error::SpanTrace::capture`] records the active span stack; the
/// HTTP error normalizer relies on it for the development `stack` field.
///
/// `RUST_LOG` overrides the default filter. Calling this more than once is
/// harmless: later calls leave the first subscriber in place.
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if is_production {
            PRODUCTION_FILTER
        } else {
            DEVELOPMENT_FILTER
        })
    });

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => info!(environment = ?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
}
