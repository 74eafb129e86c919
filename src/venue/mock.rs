//! Mock venue adapter for testing without network calls.

use super::{VenueAdapter, VenueError};
use crate::domain::{Address, Fill};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Mock venue returning canned fills per wallet.
///
/// Wallets can be marked as failing to exercise failure-isolation paths;
/// fills can be replaced between cycles to simulate overlapping re-polls.
#[derive(Debug, Default)]
pub struct MockVenue {
    fills: Mutex<HashMap<Address, Vec<Fill>>>,
    failing: Mutex<HashSet<Address>>,
}

impl MockVenue {
    /// Create an empty mock venue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fill for its wallet.
    pub fn with_fill(self, fill: Fill) -> Self {
        self.push_fill(fill);
        self
    }

    /// Add multiple fills.
    pub fn with_fills(self, fills: Vec<Fill>) -> Self {
        for fill in fills {
            self.push_fill(fill);
        }
        self
    }

    /// Mark a wallet so its fetches fail with a network error.
    pub fn with_failure(self, wallet: Address) -> Self {
        self.set_failing(wallet, true);
        self
    }

    /// Append a fill after construction.
    pub fn push_fill(&self, fill: Fill) {
        let mut fills = self.fills.lock().expect("mock venue lock");
        fills.entry(fill.wallet.clone()).or_default().push(fill);
    }

    /// Replace a wallet's feed entirely (simulates the next poll window).
    pub fn set_fills(&self, wallet: Address, new_fills: Vec<Fill>) {
        let mut fills = self.fills.lock().expect("mock venue lock");
        fills.insert(wallet, new_fills);
    }

    /// Toggle failure injection for a wallet.
    pub fn set_failing(&self, wallet: Address, failing: bool) {
        let mut set = self.failing.lock().expect("mock venue lock");
        if failing {
            set.insert(wallet);
        } else {
            set.remove(&wallet);
        }
    }
}

#[async_trait]
impl VenueAdapter for MockVenue {
    async fn user_fills(&self, wallet: &Address) -> Result<Vec<Fill>, VenueError> {
        if self.failing.lock().expect("mock venue lock").contains(wallet) {
            return Err(VenueError::Network("injected failure".to_string()));
        }

        Ok(self
            .fills
            .lock()
            .expect("mock venue lock")
            .get(wallet)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coin, Decimal, Side, TimeMs};
    use std::str::FromStr;

    fn fill(wallet: &str, tid: i64) -> Fill {
        Fill::new(
            TimeMs::new(1000),
            Address::new(wallet),
            Coin::new("BTC"),
            Side::Buy,
            Decimal::from_str("50000").unwrap(),
            Decimal::from_str("1").unwrap(),
            true,
            Some(tid),
            None,
        )
    }

    #[tokio::test]
    async fn test_returns_fills_for_wallet_only() {
        let venue = MockVenue::new()
            .with_fill(fill("0xaaa", 1))
            .with_fill(fill("0xbbb", 2));

        let fills = venue.user_fills(&Address::new("0xaaa")).await.unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].tid, Some(1));
    }

    #[tokio::test]
    async fn test_unknown_wallet_returns_empty() {
        let venue = MockVenue::new();
        let fills = venue.user_fills(&Address::new("0xccc")).await.unwrap();
        assert!(fills.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let venue = MockVenue::new().with_failure(Address::new("0xaaa"));
        let err = venue.user_fills(&Address::new("0xaaa")).await.unwrap_err();
        assert!(matches!(err, VenueError::Network(_)));

        venue.set_failing(Address::new("0xaaa"), false);
        assert!(venue.user_fills(&Address::new("0xaaa")).await.is_ok());
    }

    #[tokio::test]
    async fn test_set_fills_replaces_feed() {
        let venue = MockVenue::new().with_fill(fill("0xaaa", 1));
        venue.set_fills(Address::new("0xaaa"), vec![fill("0xaaa", 2), fill("0xaaa", 3)]);

        let fills = venue.user_fills(&Address::new("0xaaa")).await.unwrap();
        assert_eq!(fills.len(), 2);
    }
}
