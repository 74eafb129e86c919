pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod fees;
pub mod pipeline;
pub mod registry;
pub mod scheduler;
pub mod venue;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Address, Coin, Decimal, FeeStatus, FeeTransaction, Fill, PayoutRecord, PayoutStatus, Period,
    PlatformId, RevenueSummary, Side, TimeMs, TradeType,
};
pub use error::AppError;
pub use fees::{compute_fee, FeeComputation, FeeSchedule, RevenueSplitPolicy, RevenueStream};
pub use pipeline::{IngestionLoop, PayoutPreparer, RevenueAggregator};
pub use registry::{DbPlatformRegistry, Platform, PlatformRegistry};
pub use scheduler::Scheduler;
pub use venue::{HyperliquidVenue, MockVenue, VenueAdapter, VenueError};
