//! Fixed-asset register API.
//!
//! REST service over the asset register: server-side code allocation and
//! valuation, a disposal state machine, dynamic query filtering, reference
//! data, summary reporting and bulk import. Writes fan events into an
//! in-process cache invalidator.

pub mod asset_code;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod depreciation;
pub mod entities;
pub mod errors;
pub mod events;
pub mod filters;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::Router;
use serde::Serialize;

use crate::cache::CacheBackend;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::assets::AssetService;
use crate::services::imports::ImportService;
use crate::services::reference_data::ReferenceDataService;
use crate::services::summary::SummaryService;

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Service container shared by the handlers.
#[derive(Clone)]
pub struct AppServices {
    pub assets: AssetService,
    pub reference_data: ReferenceDataService,
    pub summary: SummaryService,
    pub imports: ImportService,
}

impl AppServices {
    pub fn build(
        db: Arc<DbPool>,
        cache: Arc<dyn CacheBackend>,
        event_sender: EventSender,
    ) -> Self {
        let assets = AssetService::new(db.clone(), cache.clone(), event_sender.clone());
        Self {
            reference_data: ReferenceDataService::new(db.clone(), event_sender.clone()),
            summary: SummaryService::new(db.clone(), cache),
            imports: ImportService::new(db, assets.clone(), event_sender),
            assets,
        }
    }
}

pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub cache: Arc<dyn CacheBackend>,
    pub event_sender: EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DbPool>,
        config: AppConfig,
        cache: Arc<dyn CacheBackend>,
        event_sender: EventSender,
    ) -> Self {
        let services = AppServices::build(db.clone(), cache.clone(), event_sender.clone());
        Self {
            db,
            config,
            cache,
            event_sender,
            services,
        }
    }
}

/// Full route tree. Middleware layers are applied by the binary.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", handlers::health::health_routes())
        .nest(
            "/api/v1/assets",
            handlers::assets::asset_routes().merge(handlers::imports::import_routes()),
        )
        .nest(
            "/api/v1/departments",
            handlers::departments::department_routes(),
        )
        .nest("/api/v1/employees", handlers::employees::employee_routes())
        .nest("/api/v1/suppliers", handlers::suppliers::supplier_routes())
        .nest("/api/v1/locations", handlers::locations::location_routes())
        .nest(
            "/api/v1/major-categories",
            handlers::categories::major_category_routes(),
        )
        .nest(
            "/api/v1/minor-categories",
            handlers::categories::minor_category_routes(),
        )
        .nest("/api/v1/reports", handlers::reports::report_routes())
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_envelope_serializes_data() {
        let json = serde_json::to_value(ApiResponse::success(42)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 42);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn message_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::<()>::message("done")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "done");
        assert!(json.get("data").is_none());
    }
}
