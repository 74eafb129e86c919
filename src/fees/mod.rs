//! Pure fee computation under the revenue-sharing contract.
//!
//! No I/O, no side effects. The fee schedule and the split policy are the
//! single canonical tables for rates and ratios; call sites never carry
//! literals.

use crate::domain::{Decimal, Fill, LiquidityRole, TradeType};
use serde::{Deserialize, Serialize};

/// Revenue stream a split ratio applies to.
///
/// The trading stream covers venue fills; the onramp stream covers the fiat
/// onramp affiliate commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenueStream {
    Trading,
    Onramp,
}

/// Platform-side split ratio per revenue stream.
///
/// The operator's share is always computed by subtraction, never by a second
/// multiplication, so the two shares reassemble the total exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueSplitPolicy {
    trading: Decimal,
    onramp: Decimal,
}

impl RevenueSplitPolicy {
    pub fn new(trading: Decimal, onramp: Decimal) -> Self {
        RevenueSplitPolicy { trading, onramp }
    }

    /// The platform's fraction of fees for the given stream.
    pub fn platform_ratio(&self, stream: RevenueStream) -> Decimal {
        match stream {
            RevenueStream::Trading => self.trading,
            RevenueStream::Onramp => self.onramp,
        }
    }
}

/// Canonical fee-rate table keyed by trade type and liquidity role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    spot: Decimal,
    perp_taker: Decimal,
    perp_maker: Decimal,
}

impl FeeSchedule {
    pub fn new(spot: Decimal, perp_taker: Decimal, perp_maker: Decimal) -> Self {
        FeeSchedule {
            spot,
            perp_taker,
            perp_maker,
        }
    }

    /// Look up the contract fee rate for a trade.
    pub fn fee_rate(&self, trade_type: TradeType, role: LiquidityRole) -> Decimal {
        match (trade_type, role) {
            (TradeType::Spot, _) => self.spot,
            (TradeType::Perp, LiquidityRole::Taker) => self.perp_taker,
            (TradeType::Perp, LiquidityRole::Maker) => self.perp_maker,
        }
    }
}

/// Result of computing the fee split for one fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeComputation {
    pub trade_type: TradeType,
    pub trade_volume: Decimal,
    pub fee_rate: Decimal,
    pub total_fee: Decimal,
    pub platform_share: Decimal,
    pub liquidlab_share: Decimal,
}

impl FeeComputation {
    /// The split invariant: the shares must reassemble the total exactly.
    pub fn split_is_exact(&self) -> bool {
        self.platform_share + self.liquidlab_share == self.total_fee
    }
}

/// Compute the fee split for a fill. Deterministic given identical input.
pub fn compute_fee(
    fill: &Fill,
    schedule: &FeeSchedule,
    policy: &RevenueSplitPolicy,
    stream: RevenueStream,
) -> FeeComputation {
    let trade_type = fill.trade_type();
    let trade_volume = fill.sz * fill.px;
    let fee_rate = schedule.fee_rate(trade_type, fill.liquidity_role());
    let total_fee = trade_volume * fee_rate;
    let platform_share = total_fee * policy.platform_ratio(stream);
    // Subtraction keeps platform_share + liquidlab_share == total_fee exact.
    let liquidlab_share = total_fee - platform_share;

    FeeComputation {
        trade_type,
        trade_volume,
        fee_rate,
        total_fee,
        platform_share,
        liquidlab_share,
    }
}
