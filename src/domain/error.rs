use std::io;

use thiserror::Error;

/// Library-wide error type for newrelic-lambda operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// Invalid user input that clap cannot catch on its own.
    #[error("{0}")]
    Validation(String),

    /// New Relic API failure.
    #[error("New Relic API error: {message}")]
    ApiError {
        message: String,
        status: Option<u16>,
    },

    /// AWS request failure.
    #[error("AWS error during {operation}: {details}")]
    CloudError { operation: String, details: String },

    /// CloudFormation stack exists in a state that blocks the operation.
    #[error("Cannot modify CloudFormation stack {stack} because it is in state {status}")]
    StackStateConflict { stack: String, status: String },

    /// The selected linked account points at a different AWS account than the
    /// active AWS profile.
    #[error(
        "The selected linked AWS account [{linked}] does not match the AWS account of your AWS profile [{caller}]"
    )]
    AccountMismatch { linked: String, caller: String },

    /// Permission preflight found denied actions.
    #[error("The following AWS permissions are needed to continue: {}", actions.join(", "))]
    PermissionsDenied { actions: Vec<String> },
}
