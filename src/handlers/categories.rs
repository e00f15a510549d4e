//! Category tree endpoints. Major and minor categories share a handler
//! module because minors only exist under a major.

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
use crate::services::reference_data::{
    CreateMajorCategoryRequest, CreateMinorCategoryRequest, UpdateMajorCategoryRequest,
    UpdateMinorCategoryRequest,
};
use crate::{ApiResponse, AppState};

pub fn major_category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_major_category).get(list_major_categories))
        .route(
            "/:id",
            get(get_major_category)
                .put(update_major_category)
                .delete(delete_major_category),
        )
}

pub fn minor_category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_minor_category).get(list_minor_categories))
        .route(
            "/:id",
            get(get_minor_category)
                .put(update_minor_category)
                .delete(delete_minor_category),
        )
}

async fn create_major_category(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateMajorCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .reference_data
        .create_major_category(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_major_categories(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.clamped();
    let categories = state
        .services
        .reference_data
        .list_major_categories(page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(categories)))
}

async fn get_major_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.reference_data.get_major_category(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

async fn update_major_category(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateMajorCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .reference_data
        .update_major_category(id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_major_category(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .reference_data
        .delete_major_category(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_minor_category(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateMinorCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .reference_data
        .create_minor_category(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_minor_categories(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.clamped();
    let categories = state
        .services
        .reference_data
        .list_minor_categories(page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(categories)))
}

async fn get_minor_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state.services.reference_data.get_minor_category(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

async fn update_minor_category(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateMinorCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .reference_data
        .update_minor_category(id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_minor_category(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .reference_data
        .delete_minor_category(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
