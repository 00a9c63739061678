use std::sync::Arc;

use super::driver;
use super::Database;
use crate::bootstrap::config::Configuration;

/// It builds the database driver described by the configuration and sets up
/// the schema.
///
/// # Panics
///
/// Will panic if the database cannot be initialized. The storage connection
/// is established once, at startup; later outages are handled by the health
/// probe.
#[must_use]
pub fn initialize_database(config: &Configuration) -> Arc<Box<dyn Database>> {
    Arc::new(
        driver::build(
            &config.storage.driver,
            &config.storage.url,
            config.storage.user.as_deref(),
            config.storage.password.as_deref(),
        )
        .expect("Database driver build failed."),
    )
}
