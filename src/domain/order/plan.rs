//! Purchasable plans.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Days of premium access granted by the annual plan.
pub const ANNUAL_PLAN_DAYS: i64 = 365;

/// What the buyer paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Annual subscription.
    Annual,
    /// One-off report.
    Single,
}

impl PlanType {
    /// Wire and storage value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Annual => "annual",
            PlanType::Single => "single",
        }
    }

    /// Human-readable name used in email copy.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanType::Annual => "Annual subscription",
            PlanType::Single => "Single report",
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" => Ok(PlanType::Annual),
            "single" => Ok(PlanType::Single),
            other => Err(ValidationError::invalid_format(
                "plan_type",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}
