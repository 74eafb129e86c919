//! Checkpointed ingestion loop.
//!
//! Pulls new fills for every registered platform, converts them to ledger
//! rows, skips anything already recorded, and advances each platform's
//! checkpoint only after its batch is durably committed.

use crate::db::Repository;
use crate::domain::{FeeStatus, FeeTransaction, Fill, PlatformId, TimeMs};
use crate::fees::{compute_fee, FeeSchedule, RevenueSplitPolicy, RevenueStream};
use crate::registry::{Platform, PlatformRegistry, RegistryError};
use crate::venue::VenueAdapter;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::aggregate::RevenueAggregator;

/// Outcome of triggering one ingestion cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Ran(CycleReport),
    /// A cycle was already in flight; this trigger was skipped, not queued.
    AlreadyRunning,
}

/// Per-cycle accounting across all platforms.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub platforms: Vec<PlatformOutcome>,
}

impl CycleReport {
    pub fn total_new(&self) -> usize {
        self.platforms
            .iter()
            .map(|p| match p.result {
                PlatformResult::Ingested { new, .. } => new,
                _ => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> usize {
        self.platforms
            .iter()
            .filter(|p| matches!(p.result, PlatformResult::Failed { .. }))
            .count()
    }
}

/// What happened to one platform during a cycle.
#[derive(Debug)]
pub struct PlatformOutcome {
    pub platform_id: PlatformId,
    pub result: PlatformResult,
}

#[derive(Debug)]
pub enum PlatformResult {
    Ingested {
        fetched: usize,
        new: usize,
        skipped: usize,
    },
    /// No wallet registered; nothing to attribute.
    NoWallet,
    Failed {
        stage: &'static str,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// The checkpointed ingestion loop.
pub struct IngestionLoop {
    venue: Arc<dyn VenueAdapter>,
    registry: Arc<dyn PlatformRegistry>,
    repo: Arc<Repository>,
    aggregator: RevenueAggregator,
    schedule: FeeSchedule,
    policy: RevenueSplitPolicy,
    max_concurrent: usize,
    running: AtomicBool,
}

impl IngestionLoop {
    pub fn new(
        venue: Arc<dyn VenueAdapter>,
        registry: Arc<dyn PlatformRegistry>,
        repo: Arc<Repository>,
        aggregator: RevenueAggregator,
        schedule: FeeSchedule,
        policy: RevenueSplitPolicy,
        max_concurrent: usize,
    ) -> Self {
        Self {
            venue,
            registry,
            repo,
            aggregator,
            schedule,
            policy,
            max_concurrent: max_concurrent.max(1),
            running: AtomicBool::new(false),
        }
    }

    /// Run one ingestion cycle across all registered platforms.
    ///
    /// Overlapping triggers are skipped rather than queued; platforms are
    /// processed with bounded concurrency and isolated failures.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, IngestionError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("ingestion cycle already in progress, skipping trigger");
            return Ok(CycleOutcome::AlreadyRunning);
        }

        let result = self.run_cycle_inner().await;
        self.running.store(false, Ordering::SeqCst);

        let report = result?;
        info!(
            platforms = report.platforms.len(),
            new_rows = report.total_new(),
            failures = report.failures(),
            "ingestion cycle finished"
        );
        Ok(CycleOutcome::Ran(report))
    }

    async fn run_cycle_inner(&self) -> Result<CycleReport, IngestionError> {
        let platforms = self.registry.list_platforms().await?;

        let outcomes: Vec<PlatformOutcome> = stream::iter(platforms)
            .map(|platform| async move {
                let platform_id = platform.id.clone();
                let result = self.ingest_platform(&platform).await;
                PlatformOutcome {
                    platform_id,
                    result,
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        Ok(CycleReport {
            platforms: outcomes,
        })
    }

    /// Ingest one platform's new fills. Errors are captured in the result,
    /// never propagated, so one platform cannot stall the cycle.
    async fn ingest_platform(&self, platform: &Platform) -> PlatformResult {
        let wallet = match &platform.owner_wallet {
            Some(w) => w.clone(),
            None => {
                warn!(
                    platform = platform.id.as_str(),
                    stage = "registry",
                    "platform has no wallet address, skipping"
                );
                return PlatformResult::NoWallet;
            }
        };

        let checkpoint = match self.repo.get_checkpoint(&platform.id).await {
            Ok(cp) => cp.unwrap_or(TimeMs::new(0)),
            Err(e) => {
                error!(
                    platform = platform.id.as_str(),
                    stage = "checkpoint",
                    "failed to read checkpoint: {}",
                    e
                );
                return PlatformResult::Failed {
                    stage: "checkpoint",
                    message: e.to_string(),
                };
            }
        };

        let fills = match self.venue.user_fills(&wallet).await {
            Ok(fills) => fills,
            Err(e) => {
                // Transient venue errors retry at the next scheduled cycle.
                error!(
                    platform = platform.id.as_str(),
                    stage = "fetch",
                    "venue fetch failed: {}",
                    e
                );
                return PlatformResult::Failed {
                    stage: "fetch",
                    message: e.to_string(),
                };
            }
        };

        let fetched = fills.len();
        let fresh: Vec<Fill> = fills
            .into_iter()
            .filter(|f| f.time_ms > checkpoint)
            .collect();
        let max_ts = fresh.iter().map(|f| f.time_ms).max();

        let mut rows = Vec::with_capacity(fresh.len());
        for fill in &fresh {
            let comp = compute_fee(fill, &self.schedule, &self.policy, RevenueStream::Trading);
            if !comp.split_is_exact() {
                // Downstream aggregation trusts the ledger unconditionally;
                // an inconsistent row must never land.
                error!(
                    platform = platform.id.as_str(),
                    stage = "compute",
                    trade_key = fill.trade_key(),
                    "fee split does not reassemble total, dropping row"
                );
                continue;
            }
            rows.push(FeeTransaction {
                platform_id: platform.id.clone(),
                trade_key: fill.trade_key.clone(),
                trade_type: comp.trade_type,
                trade_volume: comp.trade_volume,
                fee_rate: comp.fee_rate,
                total_fee: comp.total_fee,
                platform_share: comp.platform_share,
                liquidlab_share: comp.liquidlab_share,
                status: FeeStatus::Pending,
                created_at: fill.time_ms,
                claimed_at: None,
                distributed_at: None,
            });
        }

        let outcome = match self.repo.insert_fee_transactions_batch(&rows).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    platform = platform.id.as_str(),
                    stage = "persist",
                    "ledger write failed, checkpoint not advanced: {}",
                    e
                );
                return PlatformResult::Failed {
                    stage: "persist",
                    message: e.to_string(),
                };
            }
        };

        // Ledger rows are committed; only now may the checkpoint move.
        if let Some(ts) = max_ts {
            if let Err(e) = self.repo.advance_checkpoint(&platform.id, ts).await {
                error!(
                    platform = platform.id.as_str(),
                    stage = "checkpoint",
                    "failed to advance checkpoint: {}",
                    e
                );
                return PlatformResult::Failed {
                    stage: "checkpoint",
                    message: e.to_string(),
                };
            }
        }

        // Keep summaries at most one cycle stale.
        if let Err(e) = self
            .aggregator
            .refresh_all(&platform.id, TimeMs::now())
            .await
        {
            error!(
                platform = platform.id.as_str(),
                stage = "aggregate",
                "summary refresh failed: {}",
                e
            );
            return PlatformResult::Failed {
                stage: "aggregate",
                message: e.to_string(),
            };
        }

        if outcome.skipped > 0 {
            info!(
                platform = platform.id.as_str(),
                skipped = outcome.skipped,
                "duplicate fills skipped"
            );
        }

        PlatformResult::Ingested {
            fetched,
            new: outcome.inserted,
            skipped: outcome.skipped,
        }
    }
}
