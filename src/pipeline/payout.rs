//! Payout preparation: decide what is owed, record intents, hand off to the
//! external executor, and record the outcome.

use crate::db::Repository;
use crate::domain::{
    Decimal, PayoutRecord, PayoutStatus, Period, PlatformId, TimeMs,
};
use crate::registry::{Platform, PlatformRegistry, RegistryError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// A fund-transfer request handed to the external executor.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    pub platform_id: String,
    pub amount: Decimal,
    pub recipient_address: String,
}

/// Receipt returned by a successful executor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorReceipt {
    pub tx_hash: String,
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("executor transport error: {0}")]
    Transport(String),
    #[error("executor rejected payout: {0}")]
    Rejected(String),
}

/// External payout executor boundary. This service only decides amounts and
/// records outcomes; signing and transfer mechanics live behind this trait.
#[async_trait]
pub trait PayoutExecutor: Send + Sync {
    async fn execute(&self, request: &PayoutRequest) -> Result<ExecutorReceipt, ExecutorError>;
}

/// Executor that POSTs the request to a configured webhook endpoint and
/// expects `{"success": true, "txHash": ...}` back.
#[derive(Debug, Clone)]
pub struct WebhookPayoutExecutor {
    client: reqwest::Client,
    url: String,
}

impl WebhookPayoutExecutor {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl PayoutExecutor for WebhookPayoutExecutor {
    async fn execute(&self, request: &PayoutRequest) -> Result<ExecutorReceipt, ExecutorError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;

        if body.get("success").and_then(|v| v.as_bool()) == Some(true) {
            let tx_hash = body
                .get("txHash")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            Ok(ExecutorReceipt { tx_hash })
        } else {
            let message = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string();
            Err(ExecutorError::Rejected(message))
        }
    }
}

/// Scripted executor for tests.
#[derive(Debug, Default)]
pub struct MockPayoutExecutor {
    fail_with: Option<String>,
    tx_hash: String,
    calls: std::sync::Mutex<Vec<PayoutRequest>>,
}

impl MockPayoutExecutor {
    pub fn succeeding(tx_hash: &str) -> Self {
        Self {
            fail_with: None,
            tx_hash: tx_hash.to_string(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            tx_hash: String::new(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock executor lock").len()
    }
}

#[async_trait]
impl PayoutExecutor for MockPayoutExecutor {
    async fn execute(&self, request: &PayoutRequest) -> Result<ExecutorReceipt, ExecutorError> {
        self.calls
            .lock()
            .expect("mock executor lock")
            .push(request.clone());
        match &self.fail_with {
            Some(message) => Err(ExecutorError::Rejected(message.clone())),
            None => Ok(ExecutorReceipt {
                tx_hash: self.tx_hash.clone(),
            }),
        }
    }
}

/// Pending amount still owed for one period window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPayout {
    pub amount: Decimal,
    pub period: Period,
    pub period_start_ms: TimeMs,
}

#[derive(Debug, Error)]
pub enum PayoutError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Derives what is owed and has not yet been paid, and drives the payout
/// state machine.
pub struct PayoutPreparer {
    repo: Arc<Repository>,
    registry: Arc<dyn PlatformRegistry>,
    executor: Option<Arc<dyn PayoutExecutor>>,
    min_payout: Decimal,
    currency: String,
    settlement_period: Period,
}

impl PayoutPreparer {
    pub fn new(
        repo: Arc<Repository>,
        registry: Arc<dyn PlatformRegistry>,
        executor: Option<Arc<dyn PayoutExecutor>>,
        min_payout: Decimal,
        currency: String,
        settlement_period: Period,
    ) -> Self {
        Self {
            repo,
            registry,
            executor,
            min_payout,
            currency,
            settlement_period,
        }
    }

    /// Outstanding amounts per period: summary earnings minus non-failed
    /// payouts already recorded against the same window.
    pub async fn pending_amounts(
        &self,
        platform_id: &PlatformId,
    ) -> Result<Vec<PendingPayout>, PayoutError> {
        let mut pending = Vec::new();
        for period in Period::ALL {
            let summary = match self.repo.get_summary(platform_id, period).await? {
                Some(s) => s,
                None => continue,
            };
            let paid = self
                .repo
                .paid_amount_for_window(platform_id, summary.start_ms)
                .await?;
            let amount = (summary.platform_earnings - paid).clamp_non_negative();
            pending.push(PendingPayout {
                amount,
                period,
                period_start_ms: summary.start_ms,
            });
        }
        Ok(pending)
    }

    /// Prepare (and, when an executor is wired, execute) the payout for one
    /// platform's settlement window.
    ///
    /// A failed payout is left as a terminal record; the outstanding amount
    /// is recomputed fresh on the next cycle instead of retrying the failed
    /// record, so the executor never sees a blind resubmission.
    pub async fn prepare(&self, platform: &Platform) -> Result<Option<PayoutRecord>, PayoutError> {
        let summary = match self
            .repo
            .get_summary(&platform.id, self.settlement_period)
            .await?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        let paid = self
            .repo
            .paid_amount_for_window(&platform.id, summary.start_ms)
            .await?;
        let outstanding = (summary.platform_earnings - paid).clamp_non_negative();

        if outstanding < self.min_payout || outstanding.is_zero() {
            return Ok(None);
        }

        let recipient = match &platform.owner_wallet {
            Some(w) => w.clone(),
            None => {
                warn!(
                    platform = platform.id.as_str(),
                    stage = "payout",
                    "owed amount but no recipient wallet registered"
                );
                return Ok(None);
            }
        };

        let now = TimeMs::now();
        let record = PayoutRecord::new_pending(
            platform.id.clone(),
            platform.owner_user_id.clone(),
            outstanding,
            self.currency.clone(),
            summary.start_ms,
            now,
            recipient.clone(),
            now,
        );
        self.repo.insert_payout(&record).await?;

        info!(
            platform = platform.id.as_str(),
            amount = %outstanding,
            period = %self.settlement_period,
            "payout prepared"
        );

        let executor = match &self.executor {
            Some(e) => e.clone(),
            // Prepare-only mode: the record stays pending until an operator
            // wires an executor and re-triggers.
            None => return Ok(Some(record)),
        };

        self.repo
            .update_payout_status(&record.id, PayoutStatus::Processing, None)
            .await?;

        let request = PayoutRequest {
            platform_id: platform.id.as_str().to_string(),
            amount: outstanding,
            recipient_address: recipient.as_str().to_string(),
        };

        match executor.execute(&request).await {
            Ok(receipt) => {
                self.repo
                    .update_payout_status(
                        &record.id,
                        PayoutStatus::Completed,
                        Some(&receipt.tx_hash),
                    )
                    .await?;
                info!(
                    platform = platform.id.as_str(),
                    tx_hash = %receipt.tx_hash,
                    "payout completed"
                );
            }
            Err(e) => {
                // No automatic retry of this record; surfaced to operators.
                error!(
                    platform = platform.id.as_str(),
                    stage = "payout",
                    "executor failed: {}",
                    e
                );
                self.repo
                    .update_payout_status(&record.id, PayoutStatus::Failed, None)
                    .await?;
            }
        }

        let refreshed = self
            .repo
            .query_payouts(&platform.id)
            .await?
            .into_iter()
            .find(|p| p.id == record.id);
        Ok(refreshed)
    }

    /// Run payout preparation for every platform, isolating failures.
    pub async fn run_cycle(&self) -> Result<(), PayoutError> {
        let platforms = self.registry.list_platforms().await?;
        for platform in &platforms {
            if let Err(e) = self.prepare(platform).await {
                error!(
                    platform = platform.id.as_str(),
                    stage = "payout",
                    "payout preparation failed: {}",
                    e
                );
            }
        }
        Ok(())
    }
}
