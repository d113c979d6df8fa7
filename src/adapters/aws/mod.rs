//! AWS adapters: session construction, integration resources, and the
//! permission preflight.

mod integrations;
mod permissions;
mod session;

pub use integrations::AwsIntegrationManager;
pub use permissions::IamPermissionGate;
pub use session::AwsSession;

use aws_sdk_cloudformation::error::{ProvideErrorMetadata, SdkError};

/// Flatten an SDK error into a human-readable detail string, preferring the
/// service's own message when one is present.
pub(crate) fn sdk_error_details<E>(err: SdkError<E>) -> String
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    match &err {
        SdkError::ServiceError(context) => context
            .err()
            .meta()
            .message()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| context.err().to_string()),
        other => other.to_string(),
    }
}
