//! Fee-transaction ledger operations.

use super::Repository;
use crate::domain::{Decimal, FeeStatus, FeeTransaction, PlatformId, TimeMs, TradeType};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

/// Outcome of a batch ledger write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub inserted: usize,
    /// Rows skipped by the `(platform_id, trade_key)` unique constraint.
    pub skipped: usize,
}

impl Repository {
    /// Insert a ledger row idempotently.
    ///
    /// Returns `true` if the row was new, `false` if the `(platform_id,
    /// trade_key)` constraint made it a silent skip.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_fee_transaction(&self, tx: &FeeTransaction) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO fee_transactions (
                platform_id, trade_key, trade_type, trade_volume, fee_rate,
                total_fee, platform_share, liquidlab_share, status,
                created_at, claimed_at, distributed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(platform_id, trade_key) DO NOTHING
            "#,
        )
        .bind(tx.platform_id.as_str())
        .bind(&tx.trade_key)
        .bind(tx.trade_type.to_string())
        .bind(tx.trade_volume.to_canonical_string())
        .bind(tx.fee_rate.to_canonical_string())
        .bind(tx.total_fee.to_canonical_string())
        .bind(tx.platform_share.to_canonical_string())
        .bind(tx.liquidlab_share.to_canonical_string())
        .bind(tx.status.to_string())
        .bind(tx.created_at.as_i64())
        .bind(tx.claimed_at.map(|t| t.as_i64()))
        .bind(tx.distributed_at.map(|t| t.as_i64()))
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert a batch of ledger rows in one transaction.
    ///
    /// The whole batch commits or none of it does; the ingestion checkpoint
    /// must only advance after this returns Ok.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn insert_fee_transactions_batch(
        &self,
        txs: &[FeeTransaction],
    ) -> Result<BatchOutcome, sqlx::Error> {
        if txs.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let mut outcome = BatchOutcome::default();
        let mut db_tx = self.pool().begin().await?;

        for tx in txs {
            let result = sqlx::query(
                r#"
                INSERT INTO fee_transactions (
                    platform_id, trade_key, trade_type, trade_volume, fee_rate,
                    total_fee, platform_share, liquidlab_share, status,
                    created_at, claimed_at, distributed_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(platform_id, trade_key) DO NOTHING
                "#,
            )
            .bind(tx.platform_id.as_str())
            .bind(&tx.trade_key)
            .bind(tx.trade_type.to_string())
            .bind(tx.trade_volume.to_canonical_string())
            .bind(tx.fee_rate.to_canonical_string())
            .bind(tx.total_fee.to_canonical_string())
            .bind(tx.platform_share.to_canonical_string())
            .bind(tx.liquidlab_share.to_canonical_string())
            .bind(tx.status.to_string())
            .bind(tx.created_at.as_i64())
            .bind(tx.claimed_at.map(|t| t.as_i64()))
            .bind(tx.distributed_at.map(|t| t.as_i64()))
            .execute(&mut *db_tx)
            .await?;

            if result.rows_affected() > 0 {
                outcome.inserted += 1;
            } else {
                outcome.skipped += 1;
            }
        }

        db_tx.commit().await?;
        Ok(outcome)
    }

    /// Query ledger rows for a platform with optional status and time window.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn query_fee_transactions(
        &self,
        platform_id: &PlatformId,
        status: Option<FeeStatus>,
        from_ms: Option<TimeMs>,
        to_ms: Option<TimeMs>,
    ) -> Result<Vec<FeeTransaction>, sqlx::Error> {
        let from_ms = from_ms.unwrap_or(TimeMs::new(0)).as_i64();
        let to_ms = to_ms.unwrap_or(TimeMs::new(i64::MAX)).as_i64();

        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT platform_id, trade_key, trade_type, trade_volume, fee_rate,
                           total_fee, platform_share, liquidlab_share, status,
                           created_at, claimed_at, distributed_at
                    FROM fee_transactions
                    WHERE platform_id = ? AND status = ? AND created_at >= ? AND created_at <= ?
                    ORDER BY created_at ASC, trade_key ASC
                    "#,
                )
                .bind(platform_id.as_str())
                .bind(status.to_string())
                .bind(from_ms)
                .bind(to_ms)
                .fetch_all(self.pool())
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT platform_id, trade_key, trade_type, trade_volume, fee_rate,
                           total_fee, platform_share, liquidlab_share, status,
                           created_at, claimed_at, distributed_at
                    FROM fee_transactions
                    WHERE platform_id = ? AND created_at >= ? AND created_at <= ?
                    ORDER BY created_at ASC, trade_key ASC
                    "#,
                )
                .bind(platform_id.as_str())
                .bind(from_ms)
                .bind(to_ms)
                .fetch_all(self.pool())
                .await?
            }
        };

        Ok(rows.iter().map(row_to_fee_transaction).collect())
    }

    /// Advance a ledger row's status monotonically.
    ///
    /// The update only applies when the current status legally precedes
    /// `next`; returns `false` when the guard rejects the transition.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn advance_fee_status(
        &self,
        platform_id: &PlatformId,
        trade_key: &str,
        next: FeeStatus,
    ) -> Result<bool, sqlx::Error> {
        let allowed_from: &[FeeStatus] = match next {
            FeeStatus::Claimed => &[FeeStatus::Pending],
            FeeStatus::Distributed => &[FeeStatus::Claimed],
            FeeStatus::Failed => &[FeeStatus::Pending, FeeStatus::Claimed],
            FeeStatus::Pending => &[],
        };
        if allowed_from.is_empty() {
            return Ok(false);
        }

        let now = TimeMs::now().as_i64();
        let (claimed_at, distributed_at) = match next {
            FeeStatus::Claimed => (Some(now), None),
            FeeStatus::Distributed => (None, Some(now)),
            _ => (None, None),
        };

        // allowed_from has at most two entries; bind both slots.
        let first = allowed_from[0].to_string();
        let second = allowed_from
            .get(1)
            .map(|s| s.to_string())
            .unwrap_or_else(|| first.clone());

        let result = sqlx::query(
            r#"
            UPDATE fee_transactions
            SET status = ?,
                claimed_at = COALESCE(?, claimed_at),
                distributed_at = COALESCE(?, distributed_at)
            WHERE platform_id = ? AND trade_key = ? AND status IN (?, ?)
            "#,
        )
        .bind(next.to_string())
        .bind(claimed_at)
        .bind(distributed_at)
        .bind(platform_id.as_str())
        .bind(trade_key)
        .bind(first)
        .bind(second)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set a ledger row's status unconditionally. The only sanctioned
    /// rollback path; operator-initiated.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn admin_override_fee_status(
        &self,
        platform_id: &PlatformId,
        trade_key: &str,
        status: FeeStatus,
    ) -> Result<bool, sqlx::Error> {
        warn!(
            platform = platform_id.as_str(),
            trade_key, status = %status,
            "admin override of fee-transaction status"
        );

        let result = sqlx::query(
            "UPDATE fee_transactions SET status = ? WHERE platform_id = ? AND trade_key = ?",
        )
        .bind(status.to_string())
        .bind(platform_id.as_str())
        .bind(trade_key)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_fee_transaction(row: &sqlx::sqlite::SqliteRow) -> FeeTransaction {
    let trade_type: String = row.get("trade_type");
    let status: String = row.get("status");
    let claimed_at: Option<i64> = row.get("claimed_at");
    let distributed_at: Option<i64> = row.get("distributed_at");

    FeeTransaction {
        platform_id: PlatformId::new(row.get::<String, _>("platform_id")),
        trade_key: row.get("trade_key"),
        trade_type: TradeType::from_str(&trade_type).unwrap_or(TradeType::Perp),
        trade_volume: decimal_column(row, "trade_volume"),
        fee_rate: decimal_column(row, "fee_rate"),
        total_fee: decimal_column(row, "total_fee"),
        platform_share: decimal_column(row, "platform_share"),
        liquidlab_share: decimal_column(row, "liquidlab_share"),
        status: FeeStatus::from_str(&status).unwrap_or(FeeStatus::Pending),
        created_at: TimeMs::new(row.get("created_at")),
        claimed_at: claimed_at.map(TimeMs::new),
        distributed_at: distributed_at.map(TimeMs::new),
    }
}

pub(crate) fn decimal_column(row: &sqlx::sqlite::SqliteRow, name: &str) -> Decimal {
    let s: String = row.get(name);
    Decimal::from_str(&s).unwrap_or_default()
}
