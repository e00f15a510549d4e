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
use crate::services::reference_data::{CreateEmployeeRequest, UpdateEmployeeRequest};
use crate::{ApiResponse, AppState};

pub fn employee_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_employee).get(list_employees))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

async fn create_employee(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateEmployeeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .reference_data
        .create_employee(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_employees(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.clamped();
    let employees = state
        .services
        .reference_data
        .list_employees(page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(employees)))
}

async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = state.services.reference_data.get_employee(id).await?;
    Ok(Json(ApiResponse::success(employee)))
}

async fn update_employee(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateEmployeeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .reference_data
        .update_employee(id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_employee(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.reference_data.delete_employee(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
