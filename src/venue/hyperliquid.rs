//! Hyperliquid venue adapter using the public Info API.

use super::{VenueAdapter, VenueError};
use crate::domain::{Address, Coin, Decimal, Fill, Side, TimeMs};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Venue adapter backed by the Hyperliquid `/info` endpoint.
#[derive(Debug, Clone)]
pub struct HyperliquidVenue {
    client: Client,
    base_url: String,
}

impl HyperliquidVenue {
    /// Create a new adapter against the given base URL.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn post_info(
        &self,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, VenueError> {
        let url = format!("{}/info", self.base_url);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(VenueError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(VenueError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(VenueError::Http {
                    status: status.as_u16(),
                    message: "server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(VenueError::Http {
                    status: status.as_u16(),
                    message: "client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(VenueError::Parse(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl VenueAdapter for HyperliquidVenue {
    async fn user_fills(&self, wallet: &Address) -> Result<Vec<Fill>, VenueError> {
        debug!(wallet = %wallet, "fetching user fills");

        let payload = serde_json::json!({
            "type": "userFills",
            "user": wallet.as_str(),
            "aggregateByTime": false
        });

        let response = self.post_info(payload).await?;

        let fills_json = response
            .as_array()
            .ok_or_else(|| VenueError::Parse("expected array response".to_string()))?;

        let mut fills = Vec::new();
        for fill_json in fills_json {
            match parse_fill(fill_json, wallet) {
                Ok(fill) => fills.push(fill),
                Err(e) => {
                    warn!(wallet = %wallet, "skipping unparseable fill: {}", e);
                }
            }
        }

        Ok(fills)
    }
}

fn parse_fill(fill_json: &serde_json::Value, wallet: &Address) -> Result<Fill, VenueError> {
    let time_ms = fill_json
        .get("time")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| VenueError::Parse("missing time field".to_string()))?;

    let coin = fill_json
        .get("coin")
        .and_then(|v| v.as_str())
        .ok_or_else(|| VenueError::Parse("missing coin field".to_string()))?
        .to_string();

    let side_str = fill_json
        .get("side")
        .and_then(|v| v.as_str())
        .ok_or_else(|| VenueError::Parse("missing side field".to_string()))?;

    // Venue encodes side as book side: B = bid (buy), A = ask (sell).
    let side = match side_str {
        "B" => Side::Buy,
        "A" => Side::Sell,
        _ => {
            return Err(VenueError::Parse(format!("invalid side: {}", side_str)));
        }
    };

    let px_str = fill_json
        .get("px")
        .and_then(|v| v.as_str())
        .ok_or_else(|| VenueError::Parse("missing px field".to_string()))?;
    let px = Decimal::from_str_canonical(px_str)
        .map_err(|e| VenueError::Parse(format!("invalid px: {}", e)))?;

    let sz_str = fill_json
        .get("sz")
        .and_then(|v| v.as_str())
        .ok_or_else(|| VenueError::Parse("missing sz field".to_string()))?;
    let sz = Decimal::from_str_canonical(sz_str)
        .map_err(|e| VenueError::Parse(format!("invalid sz: {}", e)))?;

    let crossed = fill_json
        .get("crossed")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);

    let tid = fill_json.get("tid").and_then(|v| v.as_i64());
    let oid = fill_json.get("oid").and_then(|v| v.as_i64());

    Ok(Fill::new(
        TimeMs::new(time_ms),
        wallet.clone(),
        Coin::new(coin),
        side,
        px,
        sz,
        crossed,
        tid,
        oid,
    ))
}
