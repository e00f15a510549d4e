use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::errors::ApiError;
use crate::{ApiResponse, AppState};

pub fn report_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/summary", get(summary))
        .route("/assets", get(asset_report))
}

/// Register-wide summary statistics, cache-aside.
async fn summary(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let report = state.services.summary.summary().await?;
    Ok(Json(ApiResponse::success(report)))
}

/// Flattened report rows for the given filters. Responds 404 when nothing
/// matches, so report consumers can distinguish "no data" from an empty
/// page.
async fn asset_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.services.summary.report_rows(&params).await?;
    Ok(Json(ApiResponse::success(rows)))
}
