use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::AppState;
use crate::domain::{FeeStatus, PlatformId, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTransactionsQuery {
    pub status: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTransactionsResponse {
    pub transactions: Vec<FeeTransactionDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTransactionDto {
    pub trade_key: String,
    pub trade_type: String,
    pub trade_volume: String,
    pub fee_rate: String,
    pub total_fee: String,
    pub platform_share: String,
    pub liquidlab_share: String,
    pub status: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributed_at: Option<i64>,
}

pub async fn get_fee_transactions(
    Path(platform_id): Path<String>,
    Query(params): Query<FeeTransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<FeeTransactionsResponse>, AppError> {
    let platform_id = PlatformId::new(platform_id);

    let status = match params.status.as_deref() {
        Some("") | None => None,
        Some(s) => Some(
            FeeStatus::from_str(s)
                .map_err(|_| AppError::BadRequest(format!("invalid status: {}", s)))?,
        ),
    };
    let from_ms = params.from_ms.map(TimeMs::new);
    let to_ms = params.to_ms.map(TimeMs::new);

    let rows = state
        .repo
        .query_fee_transactions(&platform_id, status, from_ms, to_ms)
        .await?;

    let transactions = rows
        .into_iter()
        .map(|tx| FeeTransactionDto {
            trade_key: tx.trade_key,
            trade_type: tx.trade_type.to_string(),
            trade_volume: tx.trade_volume.to_canonical_string(),
            fee_rate: tx.fee_rate.to_canonical_string(),
            total_fee: tx.total_fee.to_canonical_string(),
            platform_share: tx.platform_share.to_canonical_string(),
            liquidlab_share: tx.liquidlab_share.to_canonical_string(),
            status: tx.status.to_string(),
            created_at: tx.created_at.as_i64(),
            claimed_at: tx.claimed_at.map(|t| t.as_i64()),
            distributed_at: tx.distributed_at.map(|t| t.as_i64()),
        })
        .collect();

    Ok(Json(FeeTransactionsResponse { transactions }))
}
