//! Interactive confirmation port definition.

use crate::domain::AppError;

/// Port for yes/no questions ahead of destructive actions.
pub trait ConfirmationPrompt {
    /// Ask a yes/no question. `Ok(false)` means the user declined.
    fn confirm(&self, message: &str) -> Result<bool, AppError>;
}
