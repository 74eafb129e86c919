//! Rolling revenue summaries and their time windows.

use crate::domain::{Decimal, PlatformId, TimeMs};
use chrono::{Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Aggregation window for a revenue summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    AllTime,
}

impl Period {
    /// All periods, in refresh order.
    pub const ALL: [Period; 4] = [
        Period::Daily,
        Period::Weekly,
        Period::Monthly,
        Period::AllTime,
    ];

    /// Start of the aggregation window ending at `now`.
    ///
    /// Daily and monthly are calendar-aligned in UTC; weekly is a rolling
    /// seven days; all-time starts at the epoch.
    pub fn window_start(&self, now: TimeMs) -> TimeMs {
        match self {
            Period::AllTime => TimeMs::new(0),
            Period::Weekly => TimeMs::new(now.as_i64().saturating_sub(WEEK_MS)),
            Period::Daily => {
                let dt = Utc
                    .timestamp_millis_opt(now.as_i64())
                    .single()
                    .unwrap_or_default();
                let day_start = dt
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .unwrap_or_default()
                    .and_utc();
                TimeMs::new(day_start.timestamp_millis())
            }
            Period::Monthly => {
                let dt = Utc
                    .timestamp_millis_opt(now.as_i64())
                    .single()
                    .unwrap_or_default();
                let month_start = dt
                    .date_naive()
                    .with_day(1)
                    .unwrap_or(dt.date_naive())
                    .and_hms_opt(0, 0, 0)
                    .unwrap_or_default()
                    .and_utc();
                TimeMs::new(month_start.timestamp_millis())
            }
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::AllTime => "all-time",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "all-time" => Ok(Period::AllTime),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}

/// One summary row per `(platform, period, window start)`.
///
/// Summaries are a cache over the fee ledger; recomputing one over identical
/// ledger state reproduces identical totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub platform_id: PlatformId,
    pub period: Period,
    pub start_ms: TimeMs,
    pub total_volume: Decimal,
    pub total_fees: Decimal,
    pub platform_earnings: Decimal,
    pub liquidlab_earnings: Decimal,
    pub trade_count: i64,
    pub last_updated_ms: TimeMs,
}
