//! Identity backend and account setup configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::{validate_url, ValidationError};

/// Identity configuration (Supabase GoTrue admin API)
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Supabase project URL
    pub supabase_url: String,

    /// Service-role key for the admin API
    pub service_role_key: String,

    /// Page size for the recovery scan
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Page ceiling for the recovery scan
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Setup token lifetime in hours
    #[serde(default = "default_token_ttl")]
    pub setup_token_ttl_hours: i64,

    /// Days used or expired tokens are kept
    #[serde(default = "default_token_retention")]
    pub token_retention_days: i64,

    /// Minimum password length accepted at account setup
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

impl IdentityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate identity configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_url(&self.supabase_url, "IDENTITY__SUPABASE_URL")?;
        if self.service_role_key.trim().is_empty() {
            return Err(ValidationError::MissingRequired("IDENTITY__SERVICE_ROLE_KEY"));
        }
        if self.page_size == 0 || self.page_size > 1000 {
            return Err(ValidationError::InvalidPaging("page_size must be 1..=1000"));
        }
        if self.max_pages == 0 {
            return Err(ValidationError::InvalidPaging("max_pages must be positive"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout("identity"));
        }
        if self.setup_token_ttl_hours <= 0 {
            return Err(ValidationError::InvalidTimeout("setup token ttl"));
        }
        if self.token_retention_days < 0 {
            return Err(ValidationError::InvalidTimeout("token retention"));
        }
        Ok(())
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            service_role_key: String::new(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            timeout_secs: default_timeout(),
            setup_token_ttl_hours: default_token_ttl(),
            token_retention_days: default_token_retention(),
            min_password_len: default_min_password_len(),
        }
    }
}

fn default_page_size() -> u32 {
    1000
}

fn default_max_pages() -> u32 {
    20
}

fn default_timeout() -> u64 {
    5
}

fn default_token_ttl() -> i64 {
    48
}

fn default_token_retention() -> i64 {
    7
}

fn default_min_password_len() -> usize {
    8
}
