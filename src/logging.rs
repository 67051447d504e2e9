//! # Structured Logging
//!
//! Installs a global `tracing` subscriber. The `KANBAN_LOG` environment
//! variable, when set, overrides the configured filter.

use crate::config::LoggingConfig;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_ENV: &str = "KANBAN_LOG";

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize logging once per process; later calls are ignored
pub fn init_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let directive = filter_directive(config);

        let layer = if config.json {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .json()
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(EnvFilter::new(&directive))
                .boxed()
        };

        // Embedding applications may already have installed a subscriber
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - keeping it");
        }

        tracing::info!(filter = %directive, json = config.json, "Logging initialized");
    });
}

fn filter_directive(config: &LoggingConfig) -> String {
    resolve_directive(std::env::var(LOG_ENV).ok(), config)
}

/// A non-blank environment override wins over the configured level
fn resolve_directive(env_value: Option<String>, config: &LoggingConfig) -> String {
    env_value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.clone())
}
