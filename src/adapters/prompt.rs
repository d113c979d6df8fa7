//! Interactive confirmation on the terminal.

use dialoguer::Confirm;

use crate::domain::AppError;
use crate::ports::ConfirmationPrompt;

/// `dialoguer`-backed implementation of [`ConfirmationPrompt`].
///
/// Defaults to "no" so that hitting enter never triggers a destructive
/// action.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl ConfirmationPrompt for TerminalPrompt {
    fn confirm(&self, message: &str) -> Result<bool, AppError> {
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .map_err(|err| AppError::Validation(format!("Failed to read confirmation: {}", err)))
    }
}
