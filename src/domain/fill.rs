//! Venue-reported trade fill and its stable dedup key.

use crate::domain::{Address, Coin, Decimal, Side, TimeMs};
use serde::{Deserialize, Serialize};

/// Classification of a fill by market type.
///
/// The venue encodes spot markets as pair symbols ("PURR/USDC") or index
/// references ("@107"); bare symbols are perpetuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Spot,
    Perp,
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeType::Spot => write!(f, "spot"),
            TradeType::Perp => write!(f, "perp"),
        }
    }
}

impl std::str::FromStr for TradeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot" => Ok(TradeType::Spot),
            "perp" => Ok(TradeType::Perp),
            other => Err(format!("unknown trade type: {}", other)),
        }
    }
}

/// Whether the fill added or removed liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiquidityRole {
    Maker,
    Taker,
}

/// A single trade fill as reported by the venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Stable unique key for this fill, the ledger dedup key.
    pub trade_key: String,
    /// Execution time in milliseconds since Unix epoch.
    pub time_ms: TimeMs,
    /// Wallet the fill is attributed to.
    pub wallet: Address,
    /// Coin/asset traded.
    pub coin: Coin,
    /// Trade side.
    pub side: Side,
    /// Price per unit.
    pub px: Decimal,
    /// Size/quantity traded.
    pub sz: Decimal,
    /// True when the order crossed the book (taker).
    pub crossed: bool,
    /// Venue trade ID (preferred stable key).
    pub tid: Option<i64>,
    /// Venue order ID.
    pub oid: Option<i64>,
}

impl Fill {
    /// Create a new Fill, deriving its stable trade key.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time_ms: TimeMs,
        wallet: Address,
        coin: Coin,
        side: Side,
        px: Decimal,
        sz: Decimal,
        crossed: bool,
        tid: Option<i64>,
        oid: Option<i64>,
    ) -> Self {
        let trade_key = Self::compute_trade_key(&wallet, &coin, time_ms, side, &px, &sz, tid, oid);
        Fill {
            trade_key,
            time_ms,
            wallet,
            coin,
            side,
            px,
            sz,
            crossed,
            tid,
            oid,
        }
    }

    /// Generate a stable unique key for this fill.
    ///
    /// Priority: `tid` (if present) > hash of deterministic fields.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_trade_key(
        wallet: &Address,
        coin: &Coin,
        time_ms: TimeMs,
        side: Side,
        px: &Decimal,
        sz: &Decimal,
        tid: Option<i64>,
        oid: Option<i64>,
    ) -> String {
        if let Some(tid) = tid {
            return format!("tid:{}", tid);
        }

        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(wallet.as_str());
        hasher.update(coin.as_str());
        hasher.update(time_ms.as_i64().to_le_bytes());
        hasher.update(if side == Side::Buy { b"B" } else { b"S" });
        hasher.update(px.to_canonical_string());
        hasher.update(sz.to_canonical_string());
        if let Some(oid) = oid {
            hasher.update(oid.to_le_bytes());
        }
        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }

    /// Classify this fill as a spot or perp trade from its coin symbol.
    pub fn trade_type(&self) -> TradeType {
        let coin = self.coin.as_str();
        if coin.contains('/') || coin.starts_with('@') {
            TradeType::Spot
        } else {
            TradeType::Perp
        }
    }

    /// Liquidity role derived from the crossed flag.
    pub fn liquidity_role(&self) -> LiquidityRole {
        if self.crossed {
            LiquidityRole::Taker
        } else {
            LiquidityRole::Maker
        }
    }

    /// Borrow the precomputed trade key.
    pub fn trade_key(&self) -> &str {
        &self.trade_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn fill(coin: &str, tid: Option<i64>, crossed: bool) -> Fill {
        Fill::new(
            TimeMs::new(1000),
            Address::new("0x123"),
            Coin::new(coin),
            Side::Buy,
            Decimal::from_str("50000").unwrap(),
            Decimal::from_str("1.5").unwrap(),
            crossed,
            tid,
            Some(456),
        )
    }

    #[test]
    fn test_trade_key_prefers_tid() {
        assert_eq!(fill("BTC", Some(12345), true).trade_key(), "tid:12345");
    }

    #[test]
    fn test_trade_key_hash_fallback_is_deterministic() {
        let a = fill("BTC", None, true);
        let b = fill("BTC", None, true);
        assert!(a.trade_key().starts_with("hash:"));
        assert_eq!(a.trade_key(), b.trade_key());
    }

    #[test]
    fn test_trade_key_differs_for_different_fills() {
        let a = fill("BTC", None, true);
        let b = fill("ETH", None, true);
        assert_ne!(a.trade_key(), b.trade_key());
    }

    #[test]
    fn test_trade_type_classification() {
        assert_eq!(fill("BTC", None, true).trade_type(), TradeType::Perp);
        assert_eq!(fill("PURR/USDC", None, true).trade_type(), TradeType::Spot);
        assert_eq!(fill("@107", None, true).trade_type(), TradeType::Spot);
    }

    #[test]
    fn test_liquidity_role() {
        assert_eq!(fill("BTC", None, true).liquidity_role(), LiquidityRole::Taker);
        assert_eq!(fill("BTC", None, false).liquidity_role(), LiquidityRole::Maker);
    }

    #[test]
    fn test_fill_serialization_round_trip() {
        let f = fill("BTC", Some(1), false);
        let json = serde_json::to_string(&f).unwrap();
        let back: Fill = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }
}
