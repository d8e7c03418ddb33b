//! Conversions API configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::{validate_url, ValidationError};

/// Analytics configuration (Meta Conversions API)
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Send purchase events at all
    #[serde(default)]
    pub enabled: bool,

    /// Pixel / dataset id
    pub pixel_id: Option<String>,

    /// Conversions API access token
    pub access_token: Option<String>,

    /// Graph API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Graph API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Test event code for the events manager
    pub test_event_code: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl AnalyticsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate analytics configuration. Credentials are only required when
    /// tracking is enabled.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.pixel_id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            return Err(ValidationError::MissingRequired("ANALYTICS__PIXEL_ID"));
        }
        if self
            .access_token
            .as_deref()
            .map_or(true, |token| token.trim().is_empty())
        {
            return Err(ValidationError::MissingRequired("ANALYTICS__ACCESS_TOKEN"));
        }
        validate_url(&self.api_url, "ANALYTICS__API_URL")?;
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout("analytics"));
        }
        Ok(())
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pixel_id: None,
            access_token: None,
            api_url: default_api_url(),
            api_version: default_api_version(),
            test_event_code: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v18.0".to_string()
}

fn default_timeout() -> u64 {
    5
}
