//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool size must be between 1 and 100")]
    InvalidPoolSize,

    #[error("Gateway working key must be exactly 32 characters")]
    InvalidWorkingKey,

    #[error("Invalid URL for {0}: must be http(s)")]
    InvalidUrl(&'static str),

    #[error("URL for {0} must use HTTPS in production")]
    UrlMustBeHttps(&'static str),

    #[error("Plan price for {0} must be greater than zero")]
    InvalidPrice(&'static str),

    #[error("Currency must be a three-letter ISO code")]
    InvalidCurrency,

    #[error("Invalid Resend API key format")]
    InvalidResendKey,

    #[error("Invalid from email address")]
    InvalidFromEmail,

    #[error("Invalid retry policy: {0}")]
    InvalidRetryPolicy(&'static str),

    #[error("Invalid identity paging: {0}")]
    InvalidPaging(&'static str),
}

/// Checks that `value` is an absolute http(s) URL.
pub(crate) fn validate_url(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingRequired(field));
    }
    if !value.starts_with("https://") && !value.starts_with("http://") {
        return Err(ValidationError::InvalidUrl(field));
    }
    Ok(())
}
