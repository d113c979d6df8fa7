//! newrelic-lambda: install, update, and remove the New Relic AWS Lambda
//! log-ingestion integration.
//!
//! The crate is organized as ports and adapters: `domain` holds value types
//! and the error taxonomy, `ports` the collaborator traits, `adapters` the
//! AWS and New Relic implementations, and `app` the command logic plus the
//! CLI surface.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use app::commands::install::{InstallOptions, InstallOutput};
pub use app::commands::uninstall::{UninstallOptions, UninstallOutput};
pub use app::commands::update::{UpdateOptions, UpdateOutput};
pub use domain::AppError;
