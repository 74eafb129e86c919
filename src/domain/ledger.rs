//! Fee-transaction ledger row: one append-only record per external fill.

use crate::domain::{Decimal, PlatformId, TimeMs, TradeType};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a ledger row.
///
/// Advances monotonically: pending -> claimed -> distributed, or -> failed.
/// Rollbacks happen only through the explicit admin override path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Pending,
    Claimed,
    Distributed,
    Failed,
}

impl FeeStatus {
    /// Whether a transition from `self` to `next` is a legal forward step.
    pub fn can_advance_to(&self, next: FeeStatus) -> bool {
        use FeeStatus::*;
        matches!(
            (self, next),
            (Pending, Claimed) | (Pending, Failed) | (Claimed, Distributed) | (Claimed, Failed)
        )
    }
}

impl std::fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FeeStatus::Pending => "pending",
            FeeStatus::Claimed => "claimed",
            FeeStatus::Distributed => "distributed",
            FeeStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for FeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FeeStatus::Pending),
            "claimed" => Ok(FeeStatus::Claimed),
            "distributed" => Ok(FeeStatus::Distributed),
            "failed" => Ok(FeeStatus::Failed),
            other => Err(format!("unknown fee status: {}", other)),
        }
    }
}

/// One row of the fee ledger.
///
/// `(platform_id, trade_key)` is unique; re-polling the venue never records
/// the same fill twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTransaction {
    pub platform_id: PlatformId,
    pub trade_key: String,
    pub trade_type: TradeType,
    pub trade_volume: Decimal,
    pub fee_rate: Decimal,
    pub total_fee: Decimal,
    pub platform_share: Decimal,
    pub liquidlab_share: Decimal,
    pub status: FeeStatus,
    pub created_at: TimeMs,
    pub claimed_at: Option<TimeMs>,
    pub distributed_at: Option<TimeMs>,
}

impl FeeTransaction {
    /// Exact-split invariant: the two shares must reassemble the total fee.
    pub fn split_is_exact(&self) -> bool {
        self.platform_share + self.liquidlab_share == self.total_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trip() {
        for s in ["pending", "claimed", "distributed", "failed"] {
            assert_eq!(FeeStatus::from_str(s).unwrap().to_string(), s);
        }
        assert!(FeeStatus::from_str("done").is_err());
    }

    #[test]
    fn test_status_advances_monotonically() {
        use FeeStatus::*;
        assert!(Pending.can_advance_to(Claimed));
        assert!(Claimed.can_advance_to(Distributed));
        assert!(Pending.can_advance_to(Failed));
        assert!(Claimed.can_advance_to(Failed));

        assert!(!Claimed.can_advance_to(Pending));
        assert!(!Distributed.can_advance_to(Claimed));
        assert!(!Distributed.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Pending));
        assert!(!Pending.can_advance_to(Distributed), "no skipping claimed");
    }

    #[test]
    fn test_split_invariant_check() {
        let tx = FeeTransaction {
            platform_id: PlatformId::new("p1"),
            trade_key: "tid:1".to_string(),
            trade_type: TradeType::Perp,
            trade_volume: Decimal::from_str("1000").unwrap(),
            fee_rate: Decimal::from_str("0.001").unwrap(),
            total_fee: Decimal::from_str("1").unwrap(),
            platform_share: Decimal::from_str("0.7").unwrap(),
            liquidlab_share: Decimal::from_str("0.3").unwrap(),
            status: FeeStatus::Pending,
            created_at: TimeMs::new(0),
            claimed_at: None,
            distributed_at: None,
        };
        assert!(tx.split_is_exact());

        let broken = FeeTransaction {
            liquidlab_share: Decimal::from_str("0.29").unwrap(),
            ..tx
        };
        assert!(!broken.split_is_exact());
    }
}
