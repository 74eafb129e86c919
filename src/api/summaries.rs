use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::AppState;
use crate::domain::{Decimal, Period, PlatformId, RevenueSummary};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    /// Null when no summary has been aggregated yet for this window.
    pub summary: Option<SummaryDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    pub platform_id: String,
    pub period: String,
    pub start_ms: i64,
    pub total_volume: String,
    pub total_fees: String,
    pub platform_earnings: String,
    pub liquidlab_earnings: String,
    pub trade_count: i64,
    pub last_updated_ms: i64,
}

impl From<RevenueSummary> for SummaryDto {
    fn from(s: RevenueSummary) -> Self {
        SummaryDto {
            platform_id: s.platform_id.as_str().to_string(),
            period: s.period.to_string(),
            start_ms: s.start_ms.as_i64(),
            total_volume: s.total_volume.to_canonical_string(),
            total_fees: s.total_fees.to_canonical_string(),
            platform_earnings: s.platform_earnings.to_canonical_string(),
            liquidlab_earnings: s.liquidlab_earnings.to_canonical_string(),
            trade_count: s.trade_count,
            last_updated_ms: s.last_updated_ms.as_i64(),
        }
    }
}

pub async fn get_revenue_summary(
    Path(platform_id): Path<String>,
    Query(params): Query<SummaryQuery>,
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, AppError> {
    let platform_id = PlatformId::new(platform_id);
    let period = match params.period.as_deref() {
        Some("") | None => Period::AllTime,
        Some(p) => Period::from_str(p)
            .map_err(|_| AppError::BadRequest(format!("invalid period: {}", p)))?,
    };

    let summary = state.repo.get_summary(&platform_id, period).await?;

    Ok(Json(SummaryResponse {
        summary: summary.map(SummaryDto::from),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllRevenuesQuery {
    pub min_revenue: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllRevenuesResponse {
    pub revenues: Vec<SummaryDto>,
}

pub async fn get_all_platform_revenues(
    Query(params): Query<AllRevenuesQuery>,
    State(state): State<AppState>,
) -> Result<Json<AllRevenuesResponse>, AppError> {
    let min_revenue = match params.min_revenue.as_deref() {
        Some("") | None => None,
        Some(s) => Some(
            Decimal::from_str(s)
                .map_err(|_| AppError::BadRequest(format!("invalid minRevenue: {}", s)))?,
        ),
    };

    let revenues = state
        .repo
        .all_platform_revenues(min_revenue)
        .await?
        .into_iter()
        .map(SummaryDto::from)
        .collect();

    Ok(Json(AllRevenuesResponse { revenues }))
}
