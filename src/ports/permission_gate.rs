//! Permission preflight port definition.

use crate::domain::AppError;

/// Port for verifying the calling principal holds the AWS permissions a
/// mutating command needs, before anything is touched.
pub trait PermissionGate {
    /// Check permissions needed by `integrations install` and
    /// `integrations update`.
    fn ensure_install_permissions(&self) -> Result<(), AppError>;

    /// Check permissions needed by `integrations uninstall`.
    fn ensure_uninstall_permissions(&self) -> Result<(), AppError>;
}
