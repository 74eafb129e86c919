use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::domain::PlatformId;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayoutsResponse {
    pub pending: Vec<PendingPayoutDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPayoutDto {
    pub amount: String,
    pub period: String,
    pub period_start_ms: i64,
}

pub async fn get_pending_payouts(
    Path(platform_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PendingPayoutsResponse>, AppError> {
    let platform_id = PlatformId::new(platform_id);

    let pending = state
        .preparer
        .pending_amounts(&platform_id)
        .await?
        .into_iter()
        .map(|p| PendingPayoutDto {
            amount: p.amount.to_canonical_string(),
            period: p.period.to_string(),
            period_start_ms: p.period_start_ms.as_i64(),
        })
        .collect();

    Ok(Json(PendingPayoutsResponse { pending }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutHistoryResponse {
    pub payouts: Vec<PayoutDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutDto {
    pub id: String,
    pub amount: String,
    pub currency: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub period_start_ms: i64,
    pub period_end_ms: i64,
    pub recipient_address: String,
    pub created_at: i64,
}

pub async fn get_payout_history(
    Path(platform_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PayoutHistoryResponse>, AppError> {
    let platform_id = PlatformId::new(platform_id);

    let payouts = state
        .repo
        .query_payouts(&platform_id)
        .await?
        .into_iter()
        .map(|p| PayoutDto {
            id: p.id,
            amount: p.amount.to_canonical_string(),
            currency: p.currency,
            status: p.status.to_string(),
            tx_hash: p.tx_hash,
            period_start_ms: p.period_start_ms.as_i64(),
            period_end_ms: p.period_end_ms.as_i64(),
            recipient_address: p.recipient_address.as_str().to_string(),
            created_at: p.created_at.as_i64(),
        })
        .collect();

    Ok(Json(PayoutHistoryResponse { payouts }))
}
