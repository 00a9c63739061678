//! Logging setup.
//!
//! It initializes the tracing subscriber once per process with the
//! threshold taken from the configuration. All components log through
//! `tracing`; any task may write concurrently.
use std::sync::Once;

use tracing_subscriber::EnvFilter;

use super::config::Configuration;

static INIT: Once = Once::new();

pub fn setup(config: &Configuration) {
    let threshold = config.logging.threshold.clone();

    INIT.call_once(|| {
        let filter = EnvFilter::try_new(&threshold).unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });

    tracing::info!("logging initialized");
}
