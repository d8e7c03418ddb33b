//! One-time account setup tokens.
//!
//! Issued to guests whose account was provisioned from a purchase. A token
//! is valid iff it is unused and unexpired; consuming it is one-shot.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, UserId};

/// Random bytes per token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Default lifetime of a freshly issued token.
pub const DEFAULT_TTL_HOURS: i64 = 48;

/// How long expired or used tokens are kept before cleanup.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// A persisted setup token.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupToken {
    pub token: String,
    pub user_id: UserId,
    /// Email at issue time, for the setup page.
    pub email: String,
    pub expires_at: Timestamp,
    pub used: bool,
    pub used_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl fmt::Debug for SetupToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupToken")
            .field("token", &"[redacted]")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .field("used", &self.used)
            .finish()
    }
}

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenInvalidReason {
    NotFound,
    AlreadyUsed,
    Expired,
}

impl TokenInvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenInvalidReason::NotFound => "not_found",
            TokenInvalidReason::AlreadyUsed => "already_used",
            TokenInvalidReason::Expired => "expired",
        }
    }
}

impl fmt::Display for TokenInvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SetupToken {
    /// Issues a fresh token from the OS CSPRNG.
    pub fn issue(user_id: UserId, email: impl Into<String>, ttl_hours: i64, now: Timestamp) -> Self {
        Self {
            token: generate_token(),
            user_id,
            email: email.into(),
            expires_at: now.add_hours(ttl_hours),
            used: false,
            used_at: None,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        !self.expires_at.is_after(&now)
    }

    /// Checks validity at `now`. Used takes precedence over expired.
    pub fn check(&self, now: Timestamp) -> Result<(), TokenInvalidReason> {
        if self.used {
            Err(TokenInvalidReason::AlreadyUsed)
        } else if self.is_expired(now) {
            Err(TokenInvalidReason::Expired)
        } else {
            Ok(())
        }
    }

    /// Whether cleanup may delete this row: unused tokens once they have
    /// been expired for the retention window, used tokens once they were
    /// used that long ago.
    pub fn is_collectable(&self, now: Timestamp, retention_days: i64) -> bool {
        let cutoff = now.minus_days(retention_days);
        if self.used {
            self.used_at.unwrap_or(self.created_at).is_before(&cutoff)
        } else {
            self.expires_at.is_before(&cutoff)
        }
    }
}

/// 32 random bytes, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
