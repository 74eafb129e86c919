//! Repository layer for database operations.
//!
//! Methods are organized across submodules by table:
//! - `ledger.rs` - fee-transaction ledger operations
//! - `summaries.rs` - revenue-summary upserts and reads
//! - `payouts.rs` - payout records and status transitions
//! - `checkpoints.rs` - per-platform ingestion checkpoints
//!
//! All writes are keyed upserts; unique constraints are the concurrency
//! control mechanism.

mod checkpoints;
mod ledger;
mod payouts;
mod summaries;

pub use ledger::BatchOutcome;

use crate::domain::{Address, PlatformId, TimeMs};
use crate::registry::Platform;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Platform operations
    // =========================================================================

    /// Register a platform or update its registration.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_platform(&self, platform: &Platform) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO platforms (id, name, owner_user_id, owner_wallet, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                owner_user_id = excluded.owner_user_id,
                owner_wallet = excluded.owner_wallet
            "#,
        )
        .bind(platform.id.as_str())
        .bind(&platform.name)
        .bind(&platform.owner_user_id)
        .bind(platform.owner_wallet.as_ref().map(|w| w.as_str().to_string()))
        .bind(TimeMs::now().as_i64())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all registered platforms.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_platforms(&self) -> Result<Vec<Platform>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, name, owner_user_id, owner_wallet FROM platforms ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let wallet: Option<String> = row.get("owner_wallet");
                Platform {
                    id: PlatformId::new(row.get::<String, _>("id")),
                    name: row.get("name"),
                    owner_user_id: row.get("owner_user_id"),
                    owner_wallet: wallet.map(Address::new),
                }
            })
            .collect())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::setup_test_db;
    use super::*;

    #[tokio::test]
    async fn test_upsert_platform_overwrites() {
        let (repo, _temp) = setup_test_db().await;

        let mut platform = Platform {
            id: PlatformId::new("plat-1"),
            name: "Alpha".to_string(),
            owner_user_id: "user-1".to_string(),
            owner_wallet: None,
        };
        repo.upsert_platform(&platform).await.unwrap();

        platform.owner_wallet = Some(Address::new("0xaaa"));
        platform.name = "Alpha Terminal".to_string();
        repo.upsert_platform(&platform).await.unwrap();

        let platforms = repo.list_platforms().await.unwrap();
        assert_eq!(platforms.len(), 1);
        assert_eq!(platforms[0].name, "Alpha Terminal");
        assert_eq!(platforms[0].owner_wallet, Some(Address::new("0xaaa")));
    }
}
