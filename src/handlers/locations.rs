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
use crate::handlers::PaginationQuery;
use crate::services::reference_data::{CreateLocationRequest, UpdateLocationRequest};
use crate::{ApiResponse, AppState};

pub fn location_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_location).get(list_locations))
        .route(
            "/:id",
            get(get_location).put(update_location).delete(delete_location),
        )
}

async fn create_location(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .reference_data
        .create_location(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_locations(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.clamped();
    let locations = state
        .services
        .reference_data
        .list_locations(page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(locations)))
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state.services.reference_data.get_location(id).await?;
    Ok(Json(ApiResponse::success(location)))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .reference_data
        .update_location(id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_location(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.reference_data.delete_location(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
