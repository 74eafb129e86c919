//! Revenue aggregation: recompute summary rows from the fee ledger.

use crate::db::Repository;
use crate::domain::{Decimal, Period, PlatformId, RevenueSummary, TimeMs};
use std::sync::Arc;
use tracing::debug;

/// Recomputes rolling summaries per platform from the ledger.
///
/// Aggregation is pure: the same ledger state always produces the same
/// summary row, so refreshing is safe to run any number of times.
#[derive(Clone)]
pub struct RevenueAggregator {
    repo: Arc<Repository>,
}

impl RevenueAggregator {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Recompute and upsert one `(platform, period)` summary as of `now`.
    pub async fn refresh(
        &self,
        platform_id: &PlatformId,
        period: Period,
        now: TimeMs,
    ) -> Result<RevenueSummary, sqlx::Error> {
        let start = period.window_start(now);
        let rows = self
            .repo
            .query_fee_transactions(platform_id, None, Some(start), Some(now))
            .await?;

        let mut summary = RevenueSummary {
            platform_id: platform_id.clone(),
            period,
            start_ms: start,
            total_volume: Decimal::zero(),
            total_fees: Decimal::zero(),
            platform_earnings: Decimal::zero(),
            liquidlab_earnings: Decimal::zero(),
            trade_count: 0,
            last_updated_ms: now,
        };

        for row in &rows {
            summary.total_volume += row.trade_volume;
            summary.total_fees += row.total_fee;
            summary.platform_earnings += row.platform_share;
            summary.liquidlab_earnings += row.liquidlab_share;
            summary.trade_count += 1;
        }

        self.repo.upsert_summary(&summary).await?;

        debug!(
            platform = platform_id.as_str(),
            period = %period,
            trades = summary.trade_count,
            fees = %summary.total_fees,
            "summary refreshed"
        );

        Ok(summary)
    }

    /// Refresh every period's summary for one platform.
    pub async fn refresh_all(
        &self,
        platform_id: &PlatformId,
        now: TimeMs,
    ) -> Result<(), sqlx::Error> {
        for period in Period::ALL {
            self.refresh(platform_id, period, now).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::domain::{FeeStatus, FeeTransaction, TradeType};
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn setup() -> (RevenueAggregator, Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        let repo = Arc::new(Repository::new(pool));
        (RevenueAggregator::new(repo.clone()), repo, temp_dir)
    }

    fn ledger_row(platform: &str, trade_key: &str, created_at: i64, volume: &str) -> FeeTransaction {
        let trade_volume = Decimal::from_str(volume).unwrap();
        let fee_rate = Decimal::from_str("0.001").unwrap();
        let total_fee = trade_volume * fee_rate;
        let platform_share = total_fee * Decimal::from_str("0.7").unwrap();
        FeeTransaction {
            platform_id: PlatformId::new(platform),
            trade_key: trade_key.to_string(),
            trade_type: TradeType::Perp,
            trade_volume,
            fee_rate,
            total_fee,
            platform_share,
            liquidlab_share: total_fee - platform_share,
            status: FeeStatus::Pending,
            created_at: TimeMs::new(created_at),
            claimed_at: None,
            distributed_at: None,
        }
    }

    #[tokio::test]
    async fn test_aggregation_fixture_totals() {
        let (aggregator, repo, _temp) = setup().await;
        let platform = PlatformId::new("plat-1");

        repo.insert_fee_transactions_batch(&[
            ledger_row("plat-1", "tid:1", 1000, "100"),
            ledger_row("plat-1", "tid:2", 2000, "200"),
            ledger_row("plat-1", "tid:3", 3000, "50"),
        ])
        .await
        .unwrap();

        let summary = aggregator
            .refresh(&platform, Period::AllTime, TimeMs::new(10_000))
            .await
            .unwrap();

        assert_eq!(summary.total_fees.to_canonical_string(), "0.35");
        assert_eq!(summary.trade_count, 3);
        assert_eq!(summary.total_volume.to_canonical_string(), "350");
        assert_eq!(
            summary.platform_earnings + summary.liquidlab_earnings,
            summary.total_fees
        );
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let (aggregator, repo, _temp) = setup().await;
        let platform = PlatformId::new("plat-1");

        repo.insert_fee_transaction(&ledger_row("plat-1", "tid:1", 1000, "100"))
            .await
            .unwrap();

        let first = aggregator
            .refresh(&platform, Period::AllTime, TimeMs::new(10_000))
            .await
            .unwrap();
        let second = aggregator
            .refresh(&platform, Period::AllTime, TimeMs::new(10_000))
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_window_excludes_older_rows() {
        let (aggregator, repo, _temp) = setup().await;
        let platform = PlatformId::new("plat-1");

        // One row eight days back, one row now; the weekly window keeps only
        // the recent one.
        let now = 10 * 86_400_000i64;
        repo.insert_fee_transactions_batch(&[
            ledger_row("plat-1", "tid:old", now - 8 * 86_400_000, "100"),
            ledger_row("plat-1", "tid:new", now - 1000, "200"),
        ])
        .await
        .unwrap();

        let weekly = aggregator
            .refresh(&platform, Period::Weekly, TimeMs::new(now))
            .await
            .unwrap();
        assert_eq!(weekly.trade_count, 1);
        assert_eq!(weekly.total_volume.to_canonical_string(), "200");

        let all_time = aggregator
            .refresh(&platform, Period::AllTime, TimeMs::new(now))
            .await
            .unwrap();
        assert_eq!(all_time.trade_count, 2);
    }

    #[tokio::test]
    async fn test_empty_ledger_yields_zero_summary() {
        let (aggregator, _repo, _temp) = setup().await;
        let summary = aggregator
            .refresh(&PlatformId::new("plat-1"), Period::Daily, TimeMs::new(10_000))
            .await
            .unwrap();
        assert_eq!(summary.trade_count, 0);
        assert!(summary.total_fees.is_zero());
    }
}
