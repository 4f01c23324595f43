//! @ai:module:intent Initialize structured logging on stderr
//! @ai:module:layer infrastructure
//! @ai:module:public_api init_logger

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// @ai:intent Install the global tracing subscriber
/// @ai:post RUST_LOG takes precedence over the verbosity flag
/// @ai:effects global state
pub fn init_logger(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "slocomments=debug,info"
    } else {
        "slocomments=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout carries the rendered specification.
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer.compact()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Logger already initialized");
    }
}
