//! `integrations update` command implementation.
//!
//! Updates the deployed log-ingestion stack in place. Parameters the user
//! did not set stay at their previously deployed values. When New Relic
//! credentials are supplied, the license key is re-fetched and pushed into
//! both the ingestion stack and the managed secret.

use crate::domain::{AppError, IngestionUpdate};
use crate::ports::{IntegrationManager, PermissionGate, PlatformApi};

/// Options for `integrations update`.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub ingestion: IngestionUpdate,
    pub skip_permissions_check: bool,
}

/// Output of `integrations update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutput {
    /// Whether a fresh license key was fetched and applied.
    pub license_key_refreshed: bool,
}

/// Execute `integrations update`.
///
/// `platform` is present only when the user supplied New Relic credentials;
/// without it the deployed license key is left untouched.
pub fn execute(
    manager: &impl IntegrationManager,
    gate: &impl PermissionGate,
    platform: Option<&dyn PlatformApi>,
    options: UpdateOptions,
) -> Result<UpdateOutput, AppError> {
    if !options.skip_permissions_check {
        gate.ensure_install_permissions()?;
    }

    let license_key = match platform {
        Some(api) => {
            api.validate_credentials()?;
            Some(api.retrieve_license_key()?)
        }
        None => None,
    };

    manager.update_log_ingestion(license_key.as_ref(), &options.ingestion)?;

    if let Some(key) = &license_key {
        manager.update_license_key(key, None)?;
    }

    Ok(UpdateOutput {
        license_key_refreshed: license_key.is_some(),
    })
}
