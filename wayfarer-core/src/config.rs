//! Recovery policy
//!
//! Token lifetimes, the account-enumeration stance of `begin_*`, and the bound on value
//! regeneration during issuance.

use crate::TokenKind;
use chrono::Duration;
use serde::{Deserialize, Serialize};

const DEFAULT_VERIFICATION_TTL: Duration = Duration::hours(24);
const DEFAULT_RESET_TTL: Duration = Duration::hours(1);
const DEFAULT_MAX_ISSUE_ATTEMPTS: u32 = 3;

/// What `begin_*` reports for an email with no identity behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumerationPolicy {
    /// Answer exactly as for a known email, without issuing anything.
    #[default]
    Conceal,
    /// Fail with `RecoveryError::IdentityMissing`.
    Reveal,
}

/// Configuration for both recovery flows.
///
/// # Example
///
/// ```rust
/// use chrono::Duration;
/// use wayfarer_core::{EnumerationPolicy, RecoveryConfig};
///
/// let config = RecoveryConfig::default()
///     .reset_ttl(Duration::minutes(15))
///     .enumeration(EnumerationPolicy::Conceal);
/// ```
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub verification_ttl: Duration,
    pub reset_ttl: Duration,
    pub enumeration: EnumerationPolicy,
    pub max_issue_attempts: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            verification_ttl: DEFAULT_VERIFICATION_TTL,
            reset_ttl: DEFAULT_RESET_TTL,
            enumeration: EnumerationPolicy::default(),
            max_issue_attempts: DEFAULT_MAX_ISSUE_ATTEMPTS,
        }
    }
}

impl RecoveryConfig {
    /// Read overrides from the environment, falling back to the defaults.
    ///
    /// | Variable                          | Meaning                              |
    /// | --------------------------------- | ------------------------------------ |
    /// | `WAYFARER_VERIFICATION_TTL_SECS`  | verification token lifetime          |
    /// | `WAYFARER_RESET_TTL_SECS`         | reset token lifetime                 |
    /// | `WAYFARER_REVEAL_UNKNOWN_EMAILS`  | `true` selects [`EnumerationPolicy::Reveal`] |
    /// | `WAYFARER_MAX_ISSUE_ATTEMPTS`     | value regeneration bound             |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let seconds = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::seconds)
        };

        let enumeration = match std::env::var("WAYFARER_REVEAL_UNKNOWN_EMAILS")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Ok("true") | Ok("1") | Ok("yes") => EnumerationPolicy::Reveal,
            _ => EnumerationPolicy::Conceal,
        };

        let max_issue_attempts = std::env::var("WAYFARER_MAX_ISSUE_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.max_issue_attempts);

        Self {
            verification_ttl: seconds("WAYFARER_VERIFICATION_TTL_SECS")
                .unwrap_or(defaults.verification_ttl),
            reset_ttl: seconds("WAYFARER_RESET_TTL_SECS").unwrap_or(defaults.reset_ttl),
            enumeration,
            max_issue_attempts: max_issue_attempts.max(1),
        }
    }

    pub fn verification_ttl(mut self, ttl: Duration) -> Self {
        self.verification_ttl = ttl;
        self
    }

    pub fn reset_ttl(mut self, ttl: Duration) -> Self {
        self.reset_ttl = ttl;
        self
    }

    pub fn enumeration(mut self, policy: EnumerationPolicy) -> Self {
        self.enumeration = policy;
        self
    }

    /// At least one attempt is always made.
    pub fn max_issue_attempts(mut self, attempts: u32) -> Self {
        self.max_issue_attempts = attempts.max(1);
        self
    }

    pub fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::EmailVerification => self.verification_ttl,
            TokenKind::PasswordReset => self.reset_ttl,
        }
    }
}
