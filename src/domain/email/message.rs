//! Outbound transactional email.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::foundation::ValidationError;
use crate::domain::order::PlanType;

/// Kind of transactional email, stored with failure records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    /// Welcome email carrying the account setup link.
    AccountSetup,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::AccountSetup => "account_setup",
        }
    }
}

impl FromStr for EmailType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "account_setup" => Ok(EmailType::AccountSetup),
            other => Err(ValidationError::invalid_format(
                "email_type",
                format!("unknown email type '{}'", other),
            )),
        }
    }
}

/// A rendered email ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub email_type: EmailType,
}

impl EmailMessage {
    /// Welcome email for a guest buyer whose account was just provisioned.
    pub fn account_setup(to: &str, setup_url: &str, plan: PlanType, ttl_hours: i64) -> Self {
        let plan_name = plan.display_name();
        let subject = format!("Your {} is ready - set up your account", plan_name);

        let text = format!(
            "Thanks for your purchase!\n\n\
             Your {plan} is active. Set a password to access it:\n\n\
             {url}\n\n\
             This link expires in {ttl} hours and can be used once.\n",
            plan = plan_name,
            url = setup_url,
            ttl = ttl_hours,
        );

        let html = format!(
            "<p>Thanks for your purchase!</p>\
             <p>Your {plan} is active. Set a password to access it:</p>\
             <p><a href=\"{url}\">Set up my account</a></p>\
             <p>This link expires in {ttl} hours and can be used once.</p>",
            plan = html_escape(plan_name),
            url = html_escape(setup_url),
            ttl = ttl_hours,
        );

        Self {
            to: to.to_string(),
            subject,
            html,
            text,
            email_type: EmailType::AccountSetup,
        }
    }
}

fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
