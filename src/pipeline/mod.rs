//! The revenue pipeline: checkpointed ingestion, summary aggregation, and
//! payout preparation.

pub mod aggregate;
pub mod ingest;
pub mod payout;

pub use aggregate::RevenueAggregator;
pub use ingest::{CycleOutcome, CycleReport, IngestionError, IngestionLoop};
pub use payout::{
    ExecutorError, ExecutorReceipt, MockPayoutExecutor, PayoutError, PayoutExecutor,
    PayoutPreparer, PayoutRequest, PendingPayout, WebhookPayoutExecutor,
};
