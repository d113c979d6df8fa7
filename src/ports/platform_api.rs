//! New Relic control-plane port definition.

use crate::domain::{AppError, LicenseKey};

/// A cloud account linked to a New Relic account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAccount {
    /// Identifier of the link on the New Relic side.
    pub id: i64,
    /// Human-readable label for the link.
    pub name: String,
    /// AWS account id recorded when the link was created.
    pub external_id: String,
}

/// Port for New Relic control-plane operations.
///
/// Implementations are scoped to a single account id / API key pair.
pub trait PlatformApi {
    /// Confirm the account id and API key pair is valid.
    fn validate_credentials(&self) -> Result<(), AppError>;

    /// Fetch the ingest license key for the account.
    fn retrieve_license_key(&self) -> Result<LicenseKey, AppError>;

    /// Look up a linked AWS account by name.
    fn linked_account_by_name(&self, name: &str) -> Result<Option<LinkedAccount>, AppError>;

    /// Link the caller's AWS account under the given name, authenticating
    /// New Relic through the integration role.
    fn create_linked_account(&self, name: &str, role_arn: &str)
    -> Result<LinkedAccount, AppError>;

    /// Enable the Lambda integration on a linked account.
    fn enable_lambda_integration(&self, linked_account_id: i64) -> Result<(), AppError>;
}
