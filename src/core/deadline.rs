//! Statutory deadline tracking
//!
//! Everything here is a pure function of the filing instant, the extension
//! slot and "now". Two signals are reported side by side:
//!
//! - [`Tier`] uses fixed calendar-day cutoffs (urgent from day 10, overdue from
//!   day 15) that do not move when an extension is granted.
//! - `progress_pct` / `past_allowed` are relative to the allowed days, which do
//!   include the extension.
//!
//! A case extended to 30 days can therefore be `Vencido` while still inside
//! its allowance; callers disambiguate with `past_allowed`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::extension::{ExtensionState, DEFAULT_EXTENSION_DAYS};

/// Standard period to resolve a case, in days
pub const STANDARD_DAYS: u32 = 15;

/// Elapsed days from which a case is flagged urgent
pub const URGENT_AFTER_DAYS: u32 = 10;

/// Upper bound for any configured period (ten years)
pub const MAX_PERIOD_DAYS: u32 = 3650;

/// Urgency classification, ordered from least to most urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    EnTiempo,
    Urgente,
    Vencido,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::EnTiempo => "en_tiempo",
            Tier::Urgente => "urgente",
            Tier::Vencido => "vencido",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Legal periods, in whole days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlinePolicy {
    /// Allowance without extension; also the fixed overdue cutoff
    pub standard_days: u32,

    /// Days added by the single extension
    pub extension_days: u32,

    /// Elapsed days from which a case is urgent
    pub urgent_after_days: u32,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            standard_days: STANDARD_DAYS,
            extension_days: DEFAULT_EXTENSION_DAYS,
            urgent_after_days: URGENT_AFTER_DAYS,
        }
    }
}

impl DeadlinePolicy {
    /// Check internal consistency of the periods
    pub fn validate(&self) -> Result<(), String> {
        if self.standard_days == 0 {
            return Err("deadlines.standard_days must be at least 1".to_string());
        }
        if self.standard_days > MAX_PERIOD_DAYS {
            return Err(format!(
                "deadlines.standard_days ({}) must not exceed {}",
                self.standard_days, MAX_PERIOD_DAYS
            ));
        }
        if self.extension_days > MAX_PERIOD_DAYS {
            return Err(format!(
                "deadlines.extension_days ({}) must not exceed {}",
                self.extension_days, MAX_PERIOD_DAYS
            ));
        }
        if self.urgent_after_days >= self.standard_days {
            return Err(format!(
                "deadlines.urgent_after_days ({}) must be below standard_days ({})",
                self.urgent_after_days, self.standard_days
            ));
        }
        Ok(())
    }
}

/// Derived deadline state of a case at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadlineView {
    /// Whole days since filing, never negative
    pub elapsed_days: i64,

    /// Standard days plus any granted extension
    pub allowed_days: i64,

    pub tier: Tier,

    /// Elapsed share of the allowance, capped at 100
    pub progress_pct: f64,

    /// Allowed minus elapsed; negative once the allowance is spent
    pub remaining_days: i64,

    pub due_at: DateTime<Utc>,

    /// Elapsed days have reached the allowance (extension included)
    pub past_allowed: bool,
}

/// Computes [`DeadlineView`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct DeadlineTracker {
    policy: DeadlinePolicy,
}

impl DeadlineTracker {
    pub fn new(policy: DeadlinePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DeadlinePolicy {
        &self.policy
    }

    /// Whole days between filing and `now`; clock skew clamps to zero
    pub fn elapsed_days(filed_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        (now - filed_at).num_days().max(0)
    }

    pub fn allowed_days(&self, extension: &ExtensionState) -> i64 {
        i64::from(self.policy.standard_days) + i64::from(extension.extra_days())
    }

    pub fn tier(&self, elapsed_days: i64) -> Tier {
        if elapsed_days >= i64::from(self.policy.standard_days) {
            Tier::Vencido
        } else if elapsed_days >= i64::from(self.policy.urgent_after_days) {
            Tier::Urgente
        } else {
            Tier::EnTiempo
        }
    }

    pub fn evaluate(
        &self,
        filed_at: DateTime<Utc>,
        extension: &ExtensionState,
        now: DateTime<Utc>,
    ) -> DeadlineView {
        let elapsed_days = Self::elapsed_days(filed_at, now);
        let allowed_days = self.allowed_days(extension);

        let progress_pct = if allowed_days > 0 {
            (100.0 * elapsed_days as f64 / allowed_days as f64).min(100.0)
        } else {
            100.0
        };

        DeadlineView {
            elapsed_days,
            allowed_days,
            tier: self.tier(elapsed_days),
            progress_pct,
            remaining_days: allowed_days - elapsed_days,
            due_at: filed_at
                .checked_add_signed(Duration::days(allowed_days))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            past_allowed: elapsed_days >= allowed_days,
        }
    }
}
