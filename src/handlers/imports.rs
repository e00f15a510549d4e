use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::services::imports::ImportRow;
use crate::{ApiResponse, AppState};

pub fn import_routes() -> Router<Arc<AppState>> {
    Router::new().route("/import", post(import_assets))
}

/// Bulk import. Always responds 200 with counters and the conflict log;
/// per-row failures are data, not errors.
async fn import_assets(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(rows): Json<Vec<ImportRow>>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .services
        .imports
        .import_assets(rows, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}
