pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod validation;

use tracing_subscriber::EnvFilter;

/// Initialize tracing. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .init();
}
