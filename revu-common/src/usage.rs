//! Usage-limit counters for feature gating
//!
//! Emails and business updates are metered per calendar month (UTC). Before a
//! gated operation the caller loads the current [`UsageCounters`], resolves the
//! business's [`EffectiveFeatures`] and asks one of the `check_*` functions
//! whether the operation fits inside the remaining allowance.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entitlements::{BatchSize, EffectiveFeatures};

/// A metering period, identified by its first day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UsagePeriod {
    pub start: NaiveDate,
}

impl UsagePeriod {
    /// Period containing `instant`
    pub fn containing(instant: DateTime<Utc>) -> Self {
        let date = instant.date_naive();
        // Day 1 exists in every month
        let start = date.with_day(1).unwrap_or(date);
        Self { start }
    }

    /// Period containing the current time
    pub fn current() -> Self {
        Self::containing(Utc::now())
    }

    /// `YYYY-MM-DD` key used in the `usage_counters` table
    pub fn key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }
}

/// Amounts consumed by one business in one period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageCounters {
    pub emails_sent: u32,
    pub updates_posted: u32,
}

/// Outcome of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum QuotaDecision {
    /// Operation fits; `remaining_after` is what is left once it is done
    Allowed { remaining_after: u32 },
    /// Operation does not fit; `remaining` is what is left now
    Denied { remaining: u32 },
}

impl QuotaDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, QuotaDecision::Allowed { .. })
    }
}

fn check(limit: u32, used: u32, requested: u32) -> QuotaDecision {
    let remaining = limit.saturating_sub(used);
    if requested <= remaining {
        QuotaDecision::Allowed {
            remaining_after: remaining - requested,
        }
    } else {
        QuotaDecision::Denied { remaining }
    }
}

/// May the business send `requested` more emails this period?
pub fn check_email_quota(
    features: &EffectiveFeatures,
    usage: &UsageCounters,
    requested: u32,
) -> QuotaDecision {
    check(features.email_limit, usage.emails_sent, requested)
}

/// May the business post one more update this period?
pub fn check_update_quota(features: &EffectiveFeatures, usage: &UsageCounters) -> QuotaDecision {
    check(features.update_limit, usage.updates_posted, 1)
}

/// Split `recipients` into send batches no larger than `batch_size`
///
/// Returns the size of each batch, in order. Zero recipients yields no batches.
pub fn email_batches(recipients: u32, batch_size: BatchSize) -> Vec<u32> {
    if recipients == 0 {
        return Vec::new();
    }

    match batch_size {
        BatchSize::Unbounded | BatchSize::Limited(0) => vec![recipients],
        BatchSize::Limited(size) => {
            let full = recipients / size;
            let rest = recipients % size;
            let mut batches = vec![size; full as usize];
            if rest > 0 {
                batches.push(rest);
            }
            batches
        }
    }
}
