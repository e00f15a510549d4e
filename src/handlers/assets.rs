use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::auth::AuthenticatedUser;
use crate::errors::ApiError;
use crate::handlers::pagination_from_map;
use crate::services::assets::{CreateAssetRequest, UpdateAssetRequest};
use crate::{ApiResponse, AppState};

pub fn asset_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_asset).get(list_active_assets))
        .route("/disposed", get(list_disposed_assets))
        .route(
            "/:id",
            get(get_asset).put(update_asset).delete(delete_asset),
        )
        .route("/:id/dispose", post(dispose_asset))
        .route("/:id/undispose", post(undispose_asset))
}

async fn create_asset(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(request): Json<CreateAssetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .assets
        .create_asset(request, user.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let asset = state.services.assets.get_asset(id).await?;
    Ok(Json(ApiResponse::success(asset)))
}

/// Lists non-disposed assets. Every query parameter other than
/// `page`/`per_page`/`match_all` is treated as a filter.
async fn list_active_assets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination_from_map(&params);
    let page_data = state
        .services
        .assets
        .list_active(&params, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(page_data)))
}

async fn list_disposed_assets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination_from_map(&params);
    let page_data = state
        .services
        .assets
        .list_disposed(&params, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(page_data)))
}

async fn update_asset(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAssetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .assets
        .update_asset(id, request, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn dispose_asset(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let disposed = state
        .services
        .assets
        .dispose_asset(id, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(disposed)))
}

async fn undispose_asset(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let restored = state
        .services
        .assets
        .undispose_asset(id, user.user_id)
        .await?;
    Ok(Json(ApiResponse::success(restored)))
}

async fn delete_asset(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.assets.delete_asset(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
