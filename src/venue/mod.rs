//! Venue adapter boundary: fetching raw fills for a wallet.
//!
//! The production implementation talks to the Hyperliquid public API; tests
//! inject [`MockVenue`]. Which one runs is decided once at startup, never by
//! branches inside the pipeline.

use crate::domain::{Address, Fill};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod hyperliquid;
pub mod mock;

pub use hyperliquid::HyperliquidVenue;
pub use mock::MockVenue;

/// Pure I/O boundary to the external exchange.
#[async_trait]
pub trait VenueAdapter: Send + Sync + fmt::Debug {
    /// Fetch recent fills attributed to a wallet.
    ///
    /// Implementations handle retry/backoff for transient failures; a
    /// returned error means the platform is skipped for this cycle and
    /// retried at the next one.
    async fn user_fills(&self, wallet: &Address) -> Result<Vec<Fill>, VenueError>;
}

/// Error type for venue operations.
#[derive(Debug, Clone, Error)]
pub enum VenueError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("rate limited")]
    RateLimited,
}
