//! Setup and initialization for the tracker application.
//!
//! [`app::setup`](crate::bootstrap::app::setup) builds the application and
//! its dependencies but does not start it; starting the independent jobs is
//! the responsibility of [`app::start`](crate::app::start).
pub mod app;
pub mod config;
pub mod jobs;
pub mod logging;
