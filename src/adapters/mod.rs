pub mod aws;
pub mod platform_http;
pub mod prompt;

pub use aws::{AwsIntegrationManager, AwsSession, IamPermissionGate};
pub use platform_http::HttpPlatformClient;
pub use prompt::TerminalPrompt;
