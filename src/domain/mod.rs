//! Domain types for the revenue-reconciliation pipeline.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper
//! - Domain primitives: PlatformId, Address, Coin, TimeMs, Side
//! - Fill with a stable dedup key, and the FeeTransaction ledger row
//! - RevenueSummary windows and PayoutRecord state machine

pub mod decimal;
pub mod fill;
pub mod ledger;
pub mod payout;
pub mod primitives;
pub mod summary;

pub use decimal::Decimal;
pub use fill::{Fill, LiquidityRole, TradeType};
pub use ledger::{FeeStatus, FeeTransaction};
pub use payout::{PayoutRecord, PayoutStatus};
pub use primitives::{Address, Coin, PlatformId, Side, TimeMs};
pub use summary::{Period, RevenueSummary};
