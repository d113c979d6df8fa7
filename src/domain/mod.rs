pub mod account;
pub mod error;
pub mod ingestion;
pub mod platform;
pub mod session;

pub use account::{AccountId, LicenseKey};
pub use error::AppError;
pub use ingestion::{DEFAULT_MEMORY_SIZE, DEFAULT_TIMEOUT, IngestionSettings, IngestionUpdate};
pub use platform::{PlatformApiConfig, PlatformRegion};
pub use session::{AWS_DEFAULT_REGION_VAR, SessionConfig};
