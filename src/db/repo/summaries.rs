//! Revenue-summary upserts and reads.

use super::ledger::decimal_column;
use super::Repository;
use crate::domain::{Decimal, Period, PlatformId, RevenueSummary, TimeMs};
use sqlx::Row;
use std::str::FromStr;

impl Repository {
    /// Upsert one summary row keyed by `(platform, period, start_ms)`.
    ///
    /// Summaries are never deleted, only overwritten.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_summary(&self, summary: &RevenueSummary) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO revenue_summaries (
                platform_id, period, start_ms, total_volume, total_fees,
                platform_earnings, liquidlab_earnings, trade_count, last_updated_ms
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(platform_id, period, start_ms) DO UPDATE SET
                total_volume = excluded.total_volume,
                total_fees = excluded.total_fees,
                platform_earnings = excluded.platform_earnings,
                liquidlab_earnings = excluded.liquidlab_earnings,
                trade_count = excluded.trade_count,
                last_updated_ms = excluded.last_updated_ms
            "#,
        )
        .bind(summary.platform_id.as_str())
        .bind(summary.period.to_string())
        .bind(summary.start_ms.as_i64())
        .bind(summary.total_volume.to_canonical_string())
        .bind(summary.total_fees.to_canonical_string())
        .bind(summary.platform_earnings.to_canonical_string())
        .bind(summary.liquidlab_earnings.to_canonical_string())
        .bind(summary.trade_count)
        .bind(summary.last_updated_ms.as_i64())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Latest summary row for a platform and period, if any.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_summary(
        &self,
        platform_id: &PlatformId,
        period: Period,
    ) -> Result<Option<RevenueSummary>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT platform_id, period, start_ms, total_volume, total_fees,
                   platform_earnings, liquidlab_earnings, trade_count, last_updated_ms
            FROM revenue_summaries
            WHERE platform_id = ? AND period = ?
            ORDER BY start_ms DESC
            LIMIT 1
            "#,
        )
        .bind(platform_id.as_str())
        .bind(period.to_string())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().map(row_to_summary))
    }

    /// All-time summaries across platforms, optionally filtered by a minimum
    /// platform-earnings floor, sorted descending by platform earnings.
    ///
    /// Decimal columns are stored as canonical text, so the filter and sort
    /// happen here rather than in SQL.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn all_platform_revenues(
        &self,
        min_revenue: Option<Decimal>,
    ) -> Result<Vec<RevenueSummary>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT platform_id, period, start_ms, total_volume, total_fees,
                   platform_earnings, liquidlab_earnings, trade_count, last_updated_ms
            FROM revenue_summaries
            WHERE period = 'all-time'
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        let mut summaries: Vec<RevenueSummary> = rows
            .iter()
            .map(row_to_summary)
            .filter(|s| match min_revenue {
                Some(min) => s.platform_earnings >= min,
                None => true,
            })
            .collect();

        summaries.sort_by(|a, b| b.platform_earnings.cmp(&a.platform_earnings));
        Ok(summaries)
    }
}

fn row_to_summary(row: &sqlx::sqlite::SqliteRow) -> RevenueSummary {
    let period: String = row.get("period");
    RevenueSummary {
        platform_id: PlatformId::new(row.get::<String, _>("platform_id")),
        period: Period::from_str(&period).unwrap_or(Period::AllTime),
        start_ms: TimeMs::new(row.get("start_ms")),
        total_volume: decimal_column(row, "total_volume"),
        total_fees: decimal_column(row, "total_fees"),
        platform_earnings: decimal_column(row, "platform_earnings"),
        liquidlab_earnings: decimal_column(row, "liquidlab_earnings"),
        trade_count: row.get("trade_count"),
        last_updated_ms: TimeMs::new(row.get("last_updated_ms")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_db;
    use super::*;

    fn summary(platform: &str, period: Period, start_ms: i64, earnings: &str) -> RevenueSummary {
        RevenueSummary {
            platform_id: PlatformId::new(platform),
            period,
            start_ms: TimeMs::new(start_ms),
            total_volume: Decimal::from_str("1000").unwrap(),
            total_fees: Decimal::from_str("1").unwrap(),
            platform_earnings: Decimal::from_str(earnings).unwrap(),
            liquidlab_earnings: Decimal::from_str("0.3").unwrap(),
            trade_count: 3,
            last_updated_ms: TimeMs::new(start_ms + 100),
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_key() {
        let (repo, _temp) = setup_test_db().await;
        let platform = PlatformId::new("plat-1");

        repo.upsert_summary(&summary("plat-1", Period::Daily, 1000, "0.7"))
            .await
            .unwrap();
        repo.upsert_summary(&summary("plat-1", Period::Daily, 1000, "1.4"))
            .await
            .unwrap();

        let got = repo
            .get_summary(&platform, Period::Daily)
            .await
            .unwrap()
            .expect("summary missing");
        assert_eq!(got.platform_earnings, Decimal::from_str("1.4").unwrap());
    }

    #[tokio::test]
    async fn test_get_summary_returns_latest_window() {
        let (repo, _temp) = setup_test_db().await;
        let platform = PlatformId::new("plat-1");

        repo.upsert_summary(&summary("plat-1", Period::Daily, 1000, "1"))
            .await
            .unwrap();
        repo.upsert_summary(&summary("plat-1", Period::Daily, 2000, "2"))
            .await
            .unwrap();

        let got = repo
            .get_summary(&platform, Period::Daily)
            .await
            .unwrap()
            .expect("summary missing");
        assert_eq!(got.start_ms, TimeMs::new(2000));
    }

    #[tokio::test]
    async fn test_get_summary_none_when_absent() {
        let (repo, _temp) = setup_test_db().await;
        let got = repo
            .get_summary(&PlatformId::new("plat-x"), Period::Weekly)
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_all_platform_revenues_sorted_and_filtered() {
        let (repo, _temp) = setup_test_db().await;

        repo.upsert_summary(&summary("plat-1", Period::AllTime, 0, "10"))
            .await
            .unwrap();
        repo.upsert_summary(&summary("plat-2", Period::AllTime, 0, "30"))
            .await
            .unwrap();
        repo.upsert_summary(&summary("plat-3", Period::AllTime, 0, "20"))
            .await
            .unwrap();
        // Daily rows must not leak into the all-time listing.
        repo.upsert_summary(&summary("plat-1", Period::Daily, 0, "99"))
            .await
            .unwrap();

        let all = repo.all_platform_revenues(None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.platform_id.as_str()).collect();
        assert_eq!(ids, vec!["plat-2", "plat-3", "plat-1"]);

        let filtered = repo
            .all_platform_revenues(Some(Decimal::from_str("15").unwrap()))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 2);
    }
}
