//! Platform registry: which platforms exist and which wallet each one
//! attributes its trading volume to.

use crate::db::Repository;
use crate::domain::{Address, PlatformId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// A registered platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub id: PlatformId,
    pub name: String,
    /// Owner account in the SaaS layer; payout recipient identity.
    pub owner_user_id: String,
    /// Wallet attributed to this platform. Platforms without one are
    /// skipped by ingestion.
    pub owner_wallet: Option<Address>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Source of the platform set the pipeline iterates.
#[async_trait]
pub trait PlatformRegistry: Send + Sync {
    async fn list_platforms(&self) -> Result<Vec<Platform>, RegistryError>;
}

/// Registry backed by the `platforms` table.
pub struct DbPlatformRegistry {
    repo: Arc<Repository>,
}

impl DbPlatformRegistry {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl PlatformRegistry for DbPlatformRegistry {
    async fn list_platforms(&self) -> Result<Vec<Platform>, RegistryError> {
        Ok(self.repo.list_platforms().await?)
    }
}
