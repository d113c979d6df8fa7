//! Identifiers and credentials for New Relic accounts.

use std::fmt;
use std::str::FromStr;

/// New Relic account number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(i64);

impl AccountId {
    /// Create an account id, rejecting non-positive values.
    pub fn new(value: i64) -> Result<Self, String> {
        if value <= 0 {
            return Err(format!("account id must be positive, got {}", value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .parse()
            .map_err(|_| format!("'{}' is not a valid account id", s))?;
        Self::new(value)
    }
}

/// Ingest license key for a New Relic account.
///
/// Wrapped so the key never leaks through `Debug` formatting of surrounding
/// structs.
#[derive(Clone, PartialEq, Eq)]
pub struct LicenseKey(String);

impl LicenseKey {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// The raw key, for handing to collaborators that ship it onward.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LicenseKey([REDACTED])")
    }
}
