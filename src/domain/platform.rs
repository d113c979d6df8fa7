//! New Relic control-plane region selection.

use std::fmt;
use std::str::FromStr;

/// New Relic region hosting the target account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformRegion {
    #[default]
    Us,
    Eu,
    Staging,
}

impl PlatformRegion {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformRegion::Us => "us",
            PlatformRegion::Eu => "eu",
            PlatformRegion::Staging => "staging",
        }
    }

    /// GraphQL endpoint for this region.
    pub fn endpoint(&self) -> &'static str {
        match self {
            PlatformRegion::Us => "https://api.newrelic.com/graphql",
            PlatformRegion::Eu => "https://api.eu.newrelic.com/graphql",
            PlatformRegion::Staging => "https://staging-api.newrelic.com/graphql",
        }
    }
}

impl fmt::Display for PlatformRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(PlatformRegion::Us),
            "eu" => Ok(PlatformRegion::Eu),
            "staging" => Ok(PlatformRegion::Staging),
            other => Err(format!(
                "'{}' is not a New Relic region (expected us, eu, or staging)",
                other
            )),
        }
    }
}

/// New Relic API configuration.
#[derive(Debug, Clone)]
pub struct PlatformApiConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl PlatformApiConfig {
    pub fn for_region(region: PlatformRegion) -> Self {
        Self {
            endpoint: region.endpoint().to_string(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for PlatformApiConfig {
    fn default() -> Self {
        Self::for_region(PlatformRegion::default())
    }
}

fn default_timeout() -> u64 {
    30
}
