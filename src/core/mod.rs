use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::ai::SharedProvider;
use crate::ai::mock::MockResponseProvider;

pub mod config;
pub use config::AppConfig;

/// Install the global tracing subscriber. `RUST_LOG` takes precedence
/// over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// The mock provider, seeded when the config asks for a reproducible run.
pub fn provider(config: &AppConfig) -> SharedProvider {
    match config.seed {
        Some(seed) => Arc::new(MockResponseProvider::with_seed(seed)),
        None => Arc::new(MockResponseProvider::new()),
    }
}
