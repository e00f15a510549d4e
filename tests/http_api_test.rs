//! End-to-end tests through the router, no network involved.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, NotSet, Set};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use asset_register_api::auth::issue_token;
use asset_register_api::cache::InMemoryCache;
use asset_register_api::config::AppConfig;
use asset_register_api::db::{ensure_schema, establish_connection_with_config, DbConfig, DbPool};
use asset_register_api::entities::{department, location, major_category, minor_category, supplier};
use asset_register_api::events::EventSender;
use asset_register_api::{api_router, AppState};

const JWT_SECRET: &str = "integration-test-secret-key-0123456789abcdef";

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 3600,
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "warn".to_string(),
        log_json: false,
        db_max_connections: 5,
        db_min_connections: 1,
        request_timeout_secs: 5,
    }
}

async fn seed_references(db: &DbPool) {
    major_category::ActiveModel {
        id: NotSet,
        name: Set("ICT".to_string()),
    }
    .insert(db)
    .await
    .unwrap();
    minor_category::ActiveModel {
        id: NotSet,
        name: Set("Laptops".to_string()),
        major_category_id: Set(1),
    }
    .insert(db)
    .await
    .unwrap();
    department::ActiveModel {
        id: NotSet,
        name: Set("Finance".to_string()),
        department_code: Set("FIN".to_string()),
        manager_id: Set(None),
        description: Set(None),
    }
    .insert(db)
    .await
    .unwrap();
    supplier::ActiveModel {
        id: NotSet,
        name: Set("Acme Supplies".to_string()),
        supplier_code: Set("SUP-1".to_string()),
        contact_person: Set("Jo".to_string()),
        phone_number: Set("0711111111".to_string()),
        email: Set("sales@acme.test".to_string()),
        address: Set("Industrial Area".to_string()),
        website: Set(None),
    }
    .insert(db)
    .await
    .unwrap();
    location::ActiveModel {
        id: NotSet,
        name: Set("Head Office".to_string()),
        latitude: Set(None),
        longitude: Set(None),
        use_current_location: Set(false),
    }
    .insert(db)
    .await
    .unwrap();
}

async fn test_app() -> axum::Router {
    // Single connection: a pooled in-memory SQLite would hand every
    // connection its own database.
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let db = Arc::new(establish_connection_with_config(&config).await.unwrap());
    ensure_schema(&db).await.unwrap();
    seed_references(&db).await;

    let (tx, _rx) = mpsc::channel(64);
    let state = Arc::new(AppState::new(
        db,
        test_config(),
        Arc::new(InMemoryCache::new()),
        EventSender::new(tx),
    ));

    api_router().with_state(state)
}

fn bearer() -> String {
    let token = issue_token(Uuid::new_v4(), None, JWT_SECRET, 600).unwrap();
    format!("Bearer {}", token)
}

fn asset_payload(barcode: &str) -> Value {
    json!({
        "barcode": barcode,
        "description": "Laptop",
        "asset_type": "MOVABLE",
        "major_category_id": 1,
        "minor_category_id": 1,
        "location_id": 1,
        "department_id": 1,
        "supplier_id": 1,
        "purchase_price": "1200.00",
        "date_of_purchase": Utc::now().date_naive(),
        "date_placed_in_service": Utc::now().date_naive(),
        "condition": "NEW",
        "status": "ACTIVE"
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn liveness_endpoint_answers() {
    let app = test_app().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn mutations_require_a_token() {
    let app = test_app().await;
    let request = Request::post("/api/v1/assets")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(asset_payload("BC-1").to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_and_fetch_an_asset() {
    let app = test_app().await;

    let create = Request::post("/api/v1/assets")
        .header(header::AUTHORIZATION, bearer())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(asset_payload("BC-1").to_string()))
        .unwrap();
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["asset_code"], "AS000001");
    // Life derived from the ICT category entry.
    assert_eq!(body["data"]["economic_life"], 3);

    let fetch = Request::get("/api/v1/assets/1").body(Body::empty()).unwrap();
    let response = app.oneshot(fetch).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["barcode"], "BC-1");
}

#[tokio::test]
async fn duplicate_barcode_maps_to_conflict() {
    let app = test_app().await;

    for _ in 0..2 {
        let request = Request::post("/api/v1/assets")
            .header(header::AUTHORIZATION, bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(asset_payload("BC-1").to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        if response.status() == StatusCode::CREATED {
            continue;
        }
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Duplicate barcode"));
        return;
    }
    panic!("second create should have conflicted");
}

#[tokio::test]
async fn unknown_asset_is_not_found() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::get("/api/v1/assets/999")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_accepts_filter_parameters() {
    let app = test_app().await;

    let request = Request::post("/api/v1/assets")
        .header(header::AUTHORIZATION, bearer())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(asset_payload("BC-1").to_string()))
        .unwrap();
    assert_eq!(
        app.clone().oneshot(request).await.unwrap().status(),
        StatusCode::CREATED
    );

    let response = app
        .oneshot(
            Request::get("/api/v1/assets?description=lap__icontains&per_page=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["per_page"], 5);
    assert_eq!(body["data"]["filtered_fields"][0], "description");
}

#[tokio::test]
async fn empty_report_is_not_found() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::get("/api/v1/reports/assets")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
