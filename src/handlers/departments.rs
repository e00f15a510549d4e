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
use crate::services::reference_data::{CreateDepartmentRequest, UpdateDepartmentRequest};
use crate::{ApiResponse, AppState};

pub fn department_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_department).get(list_departments))
        .route(
            "/:id",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
}

async fn create_department(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .reference_data
        .create_department(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_departments(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.clamped();
    let departments = state
        .services
        .reference_data
        .list_departments(page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(departments)))
}

async fn get_department(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let department = state.services.reference_data.get_department(id).await?;
    Ok(Json(ApiResponse::success(department)))
}

async fn update_department(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateDepartmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .reference_data
        .update_department(id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_department(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.reference_data.delete_department(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
