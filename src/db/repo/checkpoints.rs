//! Per-platform ingestion checkpoints.
//!
//! A checkpoint row records the highest fill timestamp whose ledger batch is
//! durably committed. Write order is always: ledger rows first, checkpoint
//! second; a crash in between re-processes fills that the unique constraint
//! then silently skips.

use super::Repository;
use crate::domain::{PlatformId, TimeMs};
use sqlx::Row;

impl Repository {
    /// Last durably processed fill timestamp for a platform, if any.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_checkpoint(
        &self,
        platform_id: &PlatformId,
    ) -> Result<Option<TimeMs>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT last_time_ms FROM ingest_checkpoints WHERE platform_id = ?",
        )
        .bind(platform_id.as_str())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|r| TimeMs::new(r.get("last_time_ms"))))
    }

    /// Advance a platform's checkpoint.
    ///
    /// The upsert takes the max of the stored and proposed values, so the
    /// checkpoint can never move backwards.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn advance_checkpoint(
        &self,
        platform_id: &PlatformId,
        ts: TimeMs,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ingest_checkpoints (platform_id, last_time_ms)
            VALUES (?, ?)
            ON CONFLICT(platform_id) DO UPDATE SET
                last_time_ms = MAX(last_time_ms, excluded.last_time_ms)
            "#,
        )
        .bind(platform_id.as_str())
        .bind(ts.as_i64())
        .execute(self.pool())
        .await?;

        Ok(())
    }
}
