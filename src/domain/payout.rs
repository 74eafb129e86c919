//! Payout records and their state machine.

use crate::domain::{Address, Decimal, PlatformId, TimeMs};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a payout.
///
/// pending -> processing -> completed | failed. A failed payout is never
/// retried in place; the next cycle recomputes the outstanding amount and
/// may create a fresh record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    /// Whether a transition from `self` to `next` is legal.
    pub fn can_advance_to(&self, next: PayoutStatus) -> bool {
        use PayoutStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Processing, Completed) | (Processing, Failed)
        )
    }

    /// Failed payouts stop counting against the window they covered.
    pub fn counts_toward_paid(&self) -> bool {
        !matches!(self, PayoutStatus::Failed)
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PayoutStatus::Pending),
            "processing" => Ok(PayoutStatus::Processing),
            "completed" => Ok(PayoutStatus::Completed),
            "failed" => Ok(PayoutStatus::Failed),
            other => Err(format!("unknown payout status: {}", other)),
        }
    }
}

/// A single payout intent and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub id: String,
    pub platform_id: PlatformId,
    pub user_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PayoutStatus,
    pub tx_hash: Option<String>,
    pub period_start_ms: TimeMs,
    pub period_end_ms: TimeMs,
    pub recipient_address: Address,
    pub created_at: TimeMs,
}

impl PayoutRecord {
    /// Create a new pending payout with a fresh id.
    #[allow(clippy::too_many_arguments)]
    pub fn new_pending(
        platform_id: PlatformId,
        user_id: String,
        amount: Decimal,
        currency: String,
        period_start_ms: TimeMs,
        period_end_ms: TimeMs,
        recipient_address: Address,
        created_at: TimeMs,
    ) -> Self {
        PayoutRecord {
            id: Uuid::new_v4().to_string(),
            platform_id,
            user_id,
            amount,
            currency,
            status: PayoutStatus::Pending,
            tx_hash: None,
            period_start_ms,
            period_end_ms,
            recipient_address,
            created_at,
        }
    }
}
