//! Port for AWS-side integration resources.

use crate::domain::{AccountId, AppError, IngestionSettings, IngestionUpdate, LicenseKey};

/// The IAM role New Relic assumes to read account telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationRole {
    pub name: String,
    pub arn: String,
}

/// Port for managing the integration role, the log-ingestion function, and
/// the license-key secret inside the target AWS account.
pub trait IntegrationManager {
    /// AWS account id of the calling principal.
    fn caller_account_id(&self) -> Result<String, AppError>;

    /// Ensure the integration role for the given New Relic account exists,
    /// creating its stack when necessary.
    fn create_integration_role(
        &self,
        role_policy: Option<&str>,
        account: AccountId,
    ) -> Result<IntegrationRole, AppError>;

    /// Delete the integration-role stack. Removing an absent stack is a
    /// no-op.
    fn remove_integration_role(&self, account: AccountId) -> Result<(), AppError>;

    /// Install the log-ingestion function stack. Skips when the function
    /// already exists.
    fn install_log_ingestion(
        &self,
        license_key: &LicenseKey,
        settings: &IngestionSettings,
    ) -> Result<(), AppError>;

    /// Update the deployed log-ingestion stack in place; unset parameters
    /// keep their previous values.
    fn update_log_ingestion(
        &self,
        license_key: Option<&LicenseKey>,
        settings: &IngestionUpdate,
    ) -> Result<(), AppError>;

    /// Delete the log-ingestion stack. Removing an absent stack is a no-op.
    fn remove_log_ingestion(&self) -> Result<(), AppError>;

    /// Store the license key as a managed secret, if not already present.
    fn install_license_key(
        &self,
        license_key: &LicenseKey,
        policy_name: Option<&str>,
    ) -> Result<(), AppError>;

    /// Refresh the managed license-key secret.
    fn update_license_key(
        &self,
        license_key: &LicenseKey,
        policy_name: Option<&str>,
    ) -> Result<(), AppError>;

    /// Delete the license-key secret stack. Removing an absent stack is a
    /// no-op.
    fn remove_license_key(&self) -> Result<(), AppError>;
}
