pub mod health;
pub mod payouts;
pub mod summaries;
pub mod transactions;

use crate::db::Repository;
use crate::pipeline::PayoutPreparer;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state for the read API.
///
/// Handlers only read the last successfully aggregated state; pipeline
/// failures never propagate here.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub preparer: Arc<PayoutPreparer>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, preparer: Arc<PayoutPreparer>) -> Self {
        Self { repo, preparer }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/platforms/:platform_id/fee-transactions",
            get(transactions::get_fee_transactions),
        )
        .route(
            "/v1/platforms/:platform_id/revenue-summary",
            get(summaries::get_revenue_summary),
        )
        .route("/v1/revenues", get(summaries::get_all_platform_revenues))
        .route(
            "/v1/platforms/:platform_id/payouts/pending",
            get(payouts::get_pending_payouts),
        )
        .route(
            "/v1/platforms/:platform_id/payouts",
            get(payouts::get_payout_history),
        )
        .layer(cors)
        .with_state(state)
}
