//! `integrations uninstall` command implementation.
//!
//! Removes the three AWS-side pieces of the integration. Each removal is
//! gated by its own confirmation prompt; `--force` answers yes to all of
//! them. A declined prompt skips that step only.

use crate::domain::{AccountId, AppError};
use crate::ports::{ConfirmationPrompt, IntegrationManager, PermissionGate};

/// Options for `integrations uninstall`.
#[derive(Debug, Clone)]
pub struct UninstallOptions {
    pub account_id: AccountId,
    pub force: bool,
    pub skip_permissions_check: bool,
}

/// Output of `integrations uninstall`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallOutput {
    pub role_removed: bool,
    pub ingestion_removed: bool,
    pub license_key_removed: bool,
}

/// Execute `integrations uninstall`.
pub fn execute(
    manager: &impl IntegrationManager,
    gate: &impl PermissionGate,
    prompt: &impl ConfirmationPrompt,
    options: UninstallOptions,
) -> Result<UninstallOutput, AppError> {
    if !options.skip_permissions_check {
        gate.ensure_uninstall_permissions()?;
    }

    let role_removed = if confirmed(
        prompt,
        &options,
        "Remove the New Relic AWS Lambda integration role?",
    )? {
        manager.remove_integration_role(options.account_id)?;
        true
    } else {
        false
    };

    let ingestion_removed = if confirmed(
        prompt,
        &options,
        "Remove the newrelic-log-ingestion function and its stack?",
    )? {
        manager.remove_log_ingestion()?;
        true
    } else {
        false
    };

    let license_key_removed = if confirmed(
        prompt,
        &options,
        "Remove the New Relic license key secret?",
    )? {
        manager.remove_license_key()?;
        true
    } else {
        false
    };

    Ok(UninstallOutput {
        role_removed,
        ingestion_removed,
        license_key_removed,
    })
}

fn confirmed(
    prompt: &impl ConfirmationPrompt,
    options: &UninstallOptions,
    message: &str,
) -> Result<bool, AppError> {
    if options.force {
        return Ok(true);
    }
    prompt.confirm(message)
}
