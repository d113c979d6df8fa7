//! AWS session construction.
//!
//! The AWS SDK is async; the rest of the tool is synchronous. The session
//! owns a single-threaded Tokio runtime and exposes `block_on` so adapters
//! can drive SDK futures from synchronous code.

use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::domain::{AppError, SessionConfig};

/// A resolved AWS session: shared SDK configuration plus the runtime used
/// to execute SDK calls.
pub struct AwsSession {
    runtime: tokio::runtime::Runtime,
    config: SdkConfig,
}

impl AwsSession {
    /// Open a session for the given profile and region selection.
    pub fn open(selection: &SessionConfig) -> Result<Self, AppError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| AppError::CloudError {
                operation: "initializing the async runtime".to_string(),
                details: e.to_string(),
            })?;

        let config = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(profile) = &selection.profile {
                loader = loader.profile_name(profile);
            }
            if let Some(region) = &selection.region {
                loader = loader.region(Region::new(region.clone()));
            }
            loader.load().await
        });

        Ok(Self { runtime, config })
    }

    /// The resolved region, if any source in the chain provided one.
    pub fn region(&self) -> Option<&str> {
        self.config.region().map(|region| region.as_ref())
    }

    /// Region label for user-facing messages.
    pub fn region_display(&self) -> &str {
        self.region().unwrap_or("(default)")
    }

    pub(crate) fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

impl std::fmt::Debug for AwsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSession")
            .field("region", &self.region())
            .finish()
    }
}
