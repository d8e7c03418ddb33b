//! Payment gateway configuration

use serde::Deserialize;

use super::error::{validate_url, ValidationError};
use crate::domain::order::PlanType;
use crate::domain::payment::WORKING_KEY_LEN;

/// Payment gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Merchant id issued by the gateway
    pub merchant_id: String,

    /// Access code sent alongside `encRequest`
    pub access_code: String,

    /// 32-character shared secret for the wire cipher
    pub working_key: String,

    /// Gateway transaction endpoint the browser form posts to
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Where the gateway posts completed payments
    pub redirect_url: String,

    /// Where the gateway posts cancelled payments
    pub cancel_url: String,

    /// Frontend base URL for success/failure pages and setup links
    pub frontend_url: String,

    /// Annual plan price in minor units
    #[serde(default = "default_annual_price")]
    pub annual_price_minor: i64,

    /// Single report price in minor units
    #[serde(default = "default_single_price")]
    pub single_price_minor: i64,

    /// ISO currency code
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Checkout page language
    #[serde(default = "default_language")]
    pub language: String,
}

impl PaymentConfig {
    /// Price of `plan` in minor units.
    pub fn price_for(&self, plan: PlanType) -> i64 {
        match plan {
            PlanType::Annual => self.annual_price_minor,
            PlanType::Single => self.single_price_minor,
        }
    }

    /// Validate payment configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.merchant_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__MERCHANT_ID"));
        }
        if self.access_code.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__ACCESS_CODE"));
        }
        if self.working_key.chars().count() != WORKING_KEY_LEN {
            return Err(ValidationError::InvalidWorkingKey);
        }

        validate_url(&self.gateway_url, "PAYMENT__GATEWAY_URL")?;
        validate_url(&self.redirect_url, "PAYMENT__REDIRECT_URL")?;
        validate_url(&self.cancel_url, "PAYMENT__CANCEL_URL")?;
        validate_url(&self.frontend_url, "PAYMENT__FRONTEND_URL")?;
        if production {
            for (url, field) in [
                (&self.gateway_url, "PAYMENT__GATEWAY_URL"),
                (&self.redirect_url, "PAYMENT__REDIRECT_URL"),
                (&self.cancel_url, "PAYMENT__CANCEL_URL"),
                (&self.frontend_url, "PAYMENT__FRONTEND_URL"),
            ] {
                if !url.starts_with("https://") {
                    return Err(ValidationError::UrlMustBeHttps(field));
                }
            }
        }

        if self.annual_price_minor <= 0 {
            return Err(ValidationError::InvalidPrice("annual"));
        }
        if self.single_price_minor <= 0 {
            return Err(ValidationError::InvalidPrice("single"));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency);
        }
        Ok(())
    }
}

fn default_gateway_url() -> String {
    "https://secure.ccavenue.com/transaction/transaction.do?command=initiateTransaction"
        .to_string()
}

fn default_annual_price() -> i64 {
    149_900
}

fn default_single_price() -> i64 {
    49_900
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_language() -> String {
    "EN".to_string()
}

#[cfg(test)]
pub(crate) fn test_payment_config() -> PaymentConfig {
    PaymentConfig {
        merchant_id: "12345".to_string(),
        access_code: "AVXX00TEST".to_string(),
        working_key: "0123456789ABCDEF0123456789ABCDEF".to_string(),
        gateway_url: default_gateway_url(),
        redirect_url: "https://api.example.com/api/payments/callback".to_string(),
        cancel_url: "https://api.example.com/api/payments/cancel".to_string(),
        frontend_url: "https://app.example.com".to_string(),
        annual_price_minor: default_annual_price(),
        single_price_minor: default_single_price(),
        currency: default_currency(),
        language: default_language(),
    }
}
