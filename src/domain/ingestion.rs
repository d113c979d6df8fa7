//! Tunables for the `newrelic-log-ingestion` function.

use crate::domain::AppError;

/// Default memory size for the log-ingestion function, in MB.
pub const DEFAULT_MEMORY_SIZE: i64 = 128;

/// Default timeout for the log-ingestion function, in seconds.
pub const DEFAULT_TIMEOUT: i64 = 30;

const MEMORY_SIZE_RANGE: std::ops::RangeInclusive<i64> = 128..=10240;
const TIMEOUT_RANGE: std::ops::RangeInclusive<i64> = 1..=900;

/// Settings for a fresh log-ingestion install. Every field is concrete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionSettings {
    /// Forward function logs in addition to platform logs.
    pub enable_logs: bool,
    /// Memory size in MB.
    pub memory_size: i64,
    /// Timeout in seconds.
    pub timeout: i64,
    /// Execution role for the ingestion function; `None` lets the stack
    /// create its own.
    pub role_name: Option<String>,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            enable_logs: false,
            memory_size: DEFAULT_MEMORY_SIZE,
            timeout: DEFAULT_TIMEOUT,
            role_name: None,
        }
    }
}

impl IngestionSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_memory_size(self.memory_size)?;
        validate_timeout(self.timeout)
    }

    /// View these settings as a fully-specified update.
    pub fn as_update(&self) -> IngestionUpdate {
        IngestionUpdate {
            enable_logs: Some(self.enable_logs),
            memory_size: Some(self.memory_size),
            timeout: Some(self.timeout),
            role_name: self.role_name.clone(),
        }
    }
}

/// Partial settings for an in-place update. `None` keeps the value the
/// deployed stack already has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionUpdate {
    pub enable_logs: Option<bool>,
    pub memory_size: Option<i64>,
    pub timeout: Option<i64>,
    pub role_name: Option<String>,
}

impl IngestionUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(memory_size) = self.memory_size {
            validate_memory_size(memory_size)?;
        }
        if let Some(timeout) = self.timeout {
            validate_timeout(timeout)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.enable_logs.is_none()
            && self.memory_size.is_none()
            && self.timeout.is_none()
            && self.role_name.is_none()
    }
}

fn validate_memory_size(memory_size: i64) -> Result<(), AppError> {
    if !MEMORY_SIZE_RANGE.contains(&memory_size) {
        return Err(AppError::Validation(format!(
            "Memory size must be between {} and {} MB, got {}",
            MEMORY_SIZE_RANGE.start(),
            MEMORY_SIZE_RANGE.end(),
            memory_size
        )));
    }
    Ok(())
}

fn validate_timeout(timeout: i64) -> Result<(), AppError> {
    if !TIMEOUT_RANGE.contains(&timeout) {
        return Err(AppError::Validation(format!(
            "Timeout must be between {} and {} seconds, got {}",
            TIMEOUT_RANGE.start(),
            TIMEOUT_RANGE.end(),
            timeout
        )));
    }
    Ok(())
}
