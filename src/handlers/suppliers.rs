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
use crate::services::reference_data::{CreateSupplierRequest, UpdateSupplierRequest};
use crate::{ApiResponse, AppState};

pub fn supplier_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_supplier).get(list_suppliers))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

async fn create_supplier(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .services
        .reference_data
        .create_supplier(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, per_page) = pagination.clamped();
    let suppliers = state
        .services
        .reference_data
        .list_suppliers(page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(suppliers)))
}

async fn get_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let supplier = state.services.reference_data.get_supplier(id).await?;
    Ok(Json(ApiResponse::success(supplier)))
}

async fn update_supplier(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateSupplierRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .services
        .reference_data
        .update_supplier(id, request)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.reference_data.delete_supplier(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
