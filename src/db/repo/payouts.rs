//! Payout records and status transitions.

use super::ledger::decimal_column;
use super::Repository;
use crate::domain::{Address, Decimal, PayoutRecord, PayoutStatus, PlatformId, TimeMs};
use sqlx::Row;
use std::str::FromStr;

impl Repository {
    /// Insert a new payout record.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_payout(&self, payout: &PayoutRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO payouts (
                id, platform_id, user_id, amount, currency, status, tx_hash,
                period_start_ms, period_end_ms, recipient_address, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payout.id)
        .bind(payout.platform_id.as_str())
        .bind(&payout.user_id)
        .bind(payout.amount.to_canonical_string())
        .bind(&payout.currency)
        .bind(payout.status.to_string())
        .bind(payout.tx_hash.as_deref())
        .bind(payout.period_start_ms.as_i64())
        .bind(payout.period_end_ms.as_i64())
        .bind(payout.recipient_address.as_str())
        .bind(payout.created_at.as_i64())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Advance a payout's status, guarded by the legal state machine.
    ///
    /// Returns `false` when the current status does not precede `next`.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn update_payout_status(
        &self,
        payout_id: &str,
        next: PayoutStatus,
        tx_hash: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let allowed_from = match next {
            PayoutStatus::Processing => PayoutStatus::Pending,
            PayoutStatus::Completed | PayoutStatus::Failed => PayoutStatus::Processing,
            PayoutStatus::Pending => return Ok(false),
        };

        let result = sqlx::query(
            r#"
            UPDATE payouts
            SET status = ?, tx_hash = COALESCE(?, tx_hash)
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(next.to_string())
        .bind(tx_hash)
        .bind(payout_id)
        .bind(allowed_from.to_string())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Payouts recorded against one settlement window.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn payouts_for_window(
        &self,
        platform_id: &PlatformId,
        period_start_ms: TimeMs,
    ) -> Result<Vec<PayoutRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, platform_id, user_id, amount, currency, status, tx_hash,
                   period_start_ms, period_end_ms, recipient_address, created_at
            FROM payouts
            WHERE platform_id = ? AND period_start_ms = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(platform_id.as_str())
        .bind(period_start_ms.as_i64())
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(row_to_payout).collect())
    }

    /// Amount already paid (non-failed) against one settlement window.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn paid_amount_for_window(
        &self,
        platform_id: &PlatformId,
        period_start_ms: TimeMs,
    ) -> Result<Decimal, sqlx::Error> {
        let payouts = self.payouts_for_window(platform_id, period_start_ms).await?;
        Ok(payouts
            .iter()
            .filter(|p| p.status.counts_toward_paid())
            .map(|p| p.amount)
            .sum())
    }

    /// Full payout history for a platform, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_payouts(
        &self,
        platform_id: &PlatformId,
    ) -> Result<Vec<PayoutRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, platform_id, user_id, amount, currency, status, tx_hash,
                   period_start_ms, period_end_ms, recipient_address, created_at
            FROM payouts
            WHERE platform_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(platform_id.as_str())
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(row_to_payout).collect())
    }
}

fn row_to_payout(row: &sqlx::sqlite::SqliteRow) -> PayoutRecord {
    let status: String = row.get("status");
    PayoutRecord {
        id: row.get("id"),
        platform_id: PlatformId::new(row.get::<String, _>("platform_id")),
        user_id: row.get("user_id"),
        amount: decimal_column(row, "amount"),
        currency: row.get("currency"),
        status: PayoutStatus::from_str(&status).unwrap_or(PayoutStatus::Pending),
        tx_hash: row.get("tx_hash"),
        period_start_ms: TimeMs::new(row.get("period_start_ms")),
        period_end_ms: TimeMs::new(row.get("period_end_ms")),
        recipient_address: Address::new(row.get::<String, _>("recipient_address")),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup_test_db;
    use super::*;

    fn payout(platform: &str, amount: &str, start: i64, created: i64) -> PayoutRecord {
        PayoutRecord::new_pending(
            PlatformId::new(platform),
            "user-1".to_string(),
            Decimal::from_str(amount).unwrap(),
            "USDC".to_string(),
            TimeMs::new(start),
            TimeMs::new(start + 1000),
            Address::new("0xaaa"),
            TimeMs::new(created),
        )
    }

    #[tokio::test]
    async fn test_insert_and_query_round_trip() {
        let (repo, _temp) = setup_test_db().await;
        let p = payout("plat-1", "80", 0, 100);
        repo.insert_payout(&p).await.unwrap();

        let history = repo.query_payouts(&p.platform_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], p);
    }

    #[tokio::test]
    async fn test_status_transition_guard() {
        let (repo, _temp) = setup_test_db().await;
        let p = payout("plat-1", "80", 0, 100);
        repo.insert_payout(&p).await.unwrap();

        // pending -> completed skips processing; rejected.
        assert!(!repo
            .update_payout_status(&p.id, PayoutStatus::Completed, Some("0xhash"))
            .await
            .unwrap());

        assert!(repo
            .update_payout_status(&p.id, PayoutStatus::Processing, None)
            .await
            .unwrap());
        assert!(repo
            .update_payout_status(&p.id, PayoutStatus::Completed, Some("0xhash"))
            .await
            .unwrap());

        let history = repo.query_payouts(&p.platform_id).await.unwrap();
        assert_eq!(history[0].status, PayoutStatus::Completed);
        assert_eq!(history[0].tx_hash.as_deref(), Some("0xhash"));
    }

    #[tokio::test]
    async fn test_paid_amount_excludes_failed() {
        let (repo, _temp) = setup_test_db().await;
        let platform = PlatformId::new("plat-1");

        let ok = payout("plat-1", "80", 0, 100);
        repo.insert_payout(&ok).await.unwrap();

        let failed = payout("plat-1", "50", 0, 200);
        repo.insert_payout(&failed).await.unwrap();
        repo.update_payout_status(&failed.id, PayoutStatus::Processing, None)
            .await
            .unwrap();
        repo.update_payout_status(&failed.id, PayoutStatus::Failed, None)
            .await
            .unwrap();

        let paid = repo
            .paid_amount_for_window(&platform, TimeMs::new(0))
            .await
            .unwrap();
        assert_eq!(paid, Decimal::from_str("80").unwrap());
    }

    #[tokio::test]
    async fn test_window_isolation() {
        let (repo, _temp) = setup_test_db().await;
        let platform = PlatformId::new("plat-1");

        repo.insert_payout(&payout("plat-1", "80", 0, 100)).await.unwrap();
        repo.insert_payout(&payout("plat-1", "30", 5000, 200))
            .await
            .unwrap();

        let window = repo
            .payouts_for_window(&platform, TimeMs::new(5000))
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].amount, Decimal::from_str("30").unwrap());
    }
}
