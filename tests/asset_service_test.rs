//! Service-level tests against an in-memory SQLite database.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DbErr, NotSet, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use asset_register_api::cache::{CacheBackend, InMemoryCache, ACTIVE_ASSETS};
use asset_register_api::db::{ensure_schema, establish_connection_with_config, DbConfig, DbPool};
use asset_register_api::depreciation::DepreciationMethod;
use asset_register_api::entities::{
    asset, department, employee, location, major_category, minor_category, supplier,
};
use asset_register_api::errors::ServiceError;
use asset_register_api::events::{Event, EventSender};
use asset_register_api::services::assets::{AssetService, CreateAssetRequest, UpdateAssetRequest};
use asset_register_api::services::imports::{ImportRow, ImportService};
use asset_register_api::services::summary::SummaryService;

struct TestContext {
    db: Arc<DbPool>,
    cache: Arc<InMemoryCache>,
    assets: AssetService,
    summary: SummaryService,
    imports: ImportService,
    events: mpsc::Receiver<Event>,
}

async fn setup() -> TestContext {
    // A pooled in-memory SQLite gives every connection its own database;
    // pin the pool to a single connection.
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let db = Arc::new(establish_connection_with_config(&config).await.unwrap());
    ensure_schema(&db).await.unwrap();
    seed_references(&db).await;

    let cache = Arc::new(InMemoryCache::new());
    let (tx, rx) = mpsc::channel(64);
    let event_sender = EventSender::new(tx);

    let assets = AssetService::new(
        db.clone(),
        cache.clone(),
        event_sender.clone(),
    );
    let summary = SummaryService::new(db.clone(), cache.clone());
    let imports = ImportService::new(db.clone(), assets.clone(), event_sender);

    TestContext {
        db,
        cache,
        assets,
        summary,
        imports,
        events: rx,
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
    major_category::ActiveModel {
        id: NotSet,
        name: Set("Furniture".to_string()),
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
    employee::ActiveModel {
        id: NotSet,
        first_name: Set("Grace".to_string()),
        middle_name: Set(None),
        last_name: Set("Mwangi".to_string()),
        employee_number: Set("E-001".to_string()),
        email: Set("grace@example.test".to_string()),
        mobile_number: Set("0700000000".to_string()),
        job_title: Set("Accountant".to_string()),
        date_of_birth: Set(chrono::NaiveDate::from_ymd_opt(1990, 4, 2).unwrap()),
        date_hired: Set(chrono::NaiveDate::from_ymd_opt(2018, 1, 15).unwrap()),
        address: Set("Nairobi".to_string()),
        department_id: Set(1),
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

fn laptop_request(barcode: &str) -> CreateAssetRequest {
    let today = Utc::now().date_naive();
    CreateAssetRequest {
        barcode: barcode.to_string(),
        rfid: None,
        description: "Laptop".to_string(),
        serial_number: None,
        model_number: None,
        asset_type: "MOVABLE".to_string(),
        major_category_id: 1,
        minor_category_id: 1,
        location_id: 1,
        department_id: 1,
        employee_id: Some(1),
        supplier_id: 1,
        economic_life: None,
        purchase_price: dec!(1000),
        price_is_per_unit: false,
        units: 1,
        revalued_amount: None,
        date_of_purchase: today,
        date_placed_in_service: today,
        condition: "NEW".to_string(),
        status: "ACTIVE".to_string(),
        depreciation_method: DepreciationMethod::StraightLine,
    }
}

#[tokio::test]
async fn create_allocates_sequential_codes_and_derives_life() {
    let mut ctx = setup().await;
    let actor = Uuid::new_v4();

    let first = ctx
        .assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();
    let second = ctx
        .assets
        .create_asset(laptop_request("BC-2"), actor)
        .await
        .unwrap();

    assert_eq!(first.asset_code, "AS000001");
    assert_eq!(second.asset_code, "AS000002");
    // Life comes from the ICT category table entry.
    assert_eq!(first.economic_life, 3);
    // Purchased today: no depreciation yet.
    assert_eq!(first.net_book_value, dec!(1000));
    assert_eq!(first.accumulated_depreciation, dec!(0));
    assert_eq!(first.created_by, Some(actor));

    assert!(matches!(
        ctx.events.try_recv(),
        Ok(Event::AssetCreated { asset_id: 1, disposed: false })
    ));
}

#[tokio::test]
async fn explicit_economic_life_overrides_category_default() {
    let ctx = setup().await;
    let mut request = laptop_request("BC-1");
    request.economic_life = Some(7);

    let created = ctx
        .assets
        .create_asset(request, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(created.economic_life, 7);
}

#[tokio::test]
async fn duplicate_barcode_is_a_conflict() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();

    ctx.assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();
    let err = ctx
        .assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::DuplicateBarcode(code) if code == "BC-1"));
}

#[tokio::test]
async fn per_unit_price_becomes_total_cost() {
    let ctx = setup().await;
    let mut request = laptop_request("BC-1");
    request.price_is_per_unit = true;
    request.units = 4;

    let created = ctx
        .assets
        .create_asset(request, Uuid::new_v4())
        .await
        .unwrap();
    assert_eq!(created.purchase_price, dec!(4000));
}

#[tokio::test]
async fn negative_price_and_future_dates_are_rejected() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();

    let mut negative = laptop_request("BC-1");
    negative.purchase_price = dec!(-1);
    assert!(matches!(
        ctx.assets.create_asset(negative, actor).await.unwrap_err(),
        ServiceError::ValidationError(_)
    ));

    let mut future = laptop_request("BC-2");
    future.date_of_purchase = Utc::now().date_naive() + chrono::Duration::days(2);
    assert!(matches!(
        ctx.assets.create_asset(future, actor).await.unwrap_err(),
        ServiceError::ValidationError(_)
    ));
}

#[tokio::test]
async fn zero_economic_life_override_is_an_invalid_schedule() {
    let ctx = setup().await;
    let mut request = laptop_request("BC-1");
    request.economic_life = Some(0);

    assert!(matches!(
        ctx.assets
            .create_asset(request, Uuid::new_v4())
            .await
            .unwrap_err(),
        ServiceError::InvalidSchedule(_)
    ));
}

#[tokio::test]
async fn disposal_state_machine() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    let created = ctx
        .assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();

    let disposed = ctx.assets.dispose_asset(created.id, actor).await.unwrap();
    assert!(disposed.is_disposed);
    assert_eq!(disposed.disposed_by, Some(actor));
    assert!(disposed.disposed_at.is_some());

    // Double disposal conflicts.
    assert!(matches!(
        ctx.assets.dispose_asset(created.id, actor).await.unwrap_err(),
        ServiceError::AlreadyDisposed(_)
    ));

    let restored = ctx.assets.undispose_asset(created.id, actor).await.unwrap();
    assert!(!restored.is_disposed);
    assert!(restored.disposed_at.is_none());
    assert_eq!(restored.undisposed_by, Some(actor));

    // Undisposing an active asset conflicts.
    assert!(matches!(
        ctx.assets
            .undispose_asset(created.id, actor)
            .await
            .unwrap_err(),
        ServiceError::NotDisposed(_)
    ));
}

#[tokio::test]
async fn update_merges_partial_fields() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    let created = ctx
        .assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();

    let updated = ctx
        .assets
        .update_asset(
            created.id,
            UpdateAssetRequest {
                description: Some("Laptop (reissued)".to_string()),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();

    assert_eq!(updated.description, "Laptop (reissued)");
    assert_eq!(updated.barcode, created.barcode);
    assert_eq!(updated.purchase_price, created.purchase_price);
    assert_eq!(updated.updated_by, Some(actor));
}

#[tokio::test]
async fn update_disposal_flag_routes_through_state_machine() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    let created = ctx
        .assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();

    let disposed = ctx
        .assets
        .update_asset(
            created.id,
            UpdateAssetRequest {
                is_disposed: Some(true),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();

    assert!(disposed.is_disposed);
    assert!(disposed.disposed_at.is_some());
}

#[tokio::test]
async fn update_to_taken_barcode_conflicts() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    ctx.assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();
    let second = ctx
        .assets
        .create_asset(laptop_request("BC-2"), actor)
        .await
        .unwrap();

    let err = ctx
        .assets
        .update_asset(
            second.id,
            UpdateAssetRequest {
                barcode: Some("BC-1".to_string()),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::DuplicateBarcode(_)));
}

#[tokio::test]
async fn active_listing_excludes_disposed_and_warms_cache() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    let first = ctx
        .assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();
    ctx.assets
        .create_asset(laptop_request("BC-2"), actor)
        .await
        .unwrap();
    ctx.assets.dispose_asset(first.id, actor).await.unwrap();

    let params = HashMap::new();
    let page = ctx.assets.list_active(&params, 1, 10).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.assets[0].barcode, "BC-2");
    assert!(ctx.cache.get(ACTIVE_ASSETS).await.unwrap().is_some());

    let disposed = ctx.assets.list_disposed(&params, 1, 10).await.unwrap();
    assert_eq!(disposed.total, 1);
    assert_eq!(disposed.assets[0].barcode, "BC-1");
}

#[tokio::test]
async fn listing_applies_filter_parameters() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    ctx.assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();
    let mut printer = laptop_request("BC-2");
    printer.description = "Printer".to_string();
    ctx.assets.create_asset(printer, actor).await.unwrap();

    let mut params = HashMap::new();
    params.insert("description".to_string(), "print__icontains".to_string());
    let page = ctx.assets.list_active(&params, 1, 10).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.assets[0].description, "Printer");
    assert_eq!(page.filtered_fields, vec!["description"]);
}

#[tokio::test]
async fn summary_aggregates_and_serves_from_cache() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    ctx.assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();
    let second = ctx
        .assets
        .create_asset(laptop_request("BC-2"), actor)
        .await
        .unwrap();
    ctx.assets.dispose_asset(second.id, actor).await.unwrap();

    let report = ctx.summary.summary().await.unwrap();
    assert_eq!(report.total_assets, 2);
    assert_eq!(report.active_assets, 1);
    assert_eq!(report.disposed_assets, 1);
    assert_eq!(report.total_purchase_price, dec!(1000));
    assert_eq!(report.total_net_book_value, dec!(1000));
    assert_eq!(report.departments, 1);
    assert_eq!(report.by_department.len(), 1);
    assert_eq!(report.by_department[0].name, "Finance");

    // A direct write bypassing the event loop leaves the cached blob in
    // place, so the same figures come back.
    ctx.assets
        .create_asset(laptop_request("BC-3"), actor)
        .await
        .unwrap();
    let cached = ctx.summary.summary().await.unwrap();
    assert_eq!(cached.total_assets, 2);
}

#[tokio::test]
async fn report_rows_resolve_names_and_404_when_empty() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    ctx.assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();

    let rows = ctx.summary.report_rows(&HashMap::new()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].department, "Finance");
    assert_eq!(rows[0].custodian.as_deref(), Some("Grace Mwangi"));

    let mut params = HashMap::new();
    params.insert("description".to_string(), "Nonexistent".to_string());
    assert!(matches!(
        ctx.summary.report_rows(&params).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn import_creates_updates_and_logs_conflicts() {
    let mut ctx = setup().await;
    let actor = Uuid::new_v4();
    let existing = ctx
        .assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();

    let mut update_row = laptop_request("BC-1");
    update_row.description = "Laptop (refreshed)".to_string();

    let mut bad_row = laptop_request("BC-1"); // duplicate barcode
    bad_row.description = "Duplicate".to_string();

    let rows = vec![
        ImportRow {
            asset_code: None,
            details: laptop_request("BC-2"),
        },
        ImportRow {
            asset_code: Some("DEFAULT".to_string()),
            details: laptop_request("BC-3"),
        },
        ImportRow {
            asset_code: Some(existing.asset_code.clone()),
            details: update_row,
        },
        ImportRow {
            asset_code: None,
            details: bad_row,
        },
        ImportRow {
            asset_code: Some("AS999999".to_string()),
            details: laptop_request("BC-4"),
        },
    ];

    let outcome = ctx.imports.import_assets(rows, actor).await.unwrap();

    assert_eq!(outcome.created, 2);
    assert_eq!(outcome.updated, 1);
    assert_eq!(outcome.conflicts.len(), 2);
    assert_eq!(outcome.conflicts[0].barcode, "BC-1");
    assert_eq!(outcome.conflicts[1].asset_code.as_deref(), Some("AS999999"));

    let refreshed = ctx.assets.get_asset(existing.id).await.unwrap();
    assert_eq!(refreshed.description, "Laptop (refreshed)");

    // The batch finishes with a completion event after the per-row ones.
    let mut saw_completion = false;
    while let Ok(event) = ctx.events.try_recv() {
        if let Event::ImportCompleted { created, updated } = event {
            assert_eq!(created, 2);
            assert_eq!(updated, 1);
            saw_completion = true;
        }
    }
    assert!(saw_completion);
}

#[tokio::test]
async fn unique_index_backstops_concurrent_barcode_writes() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    let first = ctx
        .assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();

    // A second writer that passed the pre-check before the first commit
    // lands on the unique index; its error must map to the same conflict.
    let mut racer: asset::ActiveModel = first.clone().into();
    racer = racer.reset_all();
    racer.id = NotSet;
    racer.asset_code = Set("AS000099".to_string());
    let err = racer.insert(ctx.db.as_ref()).await.unwrap_err();

    let mapped = ServiceError::from_asset_write(err, &first.barcode);
    assert!(matches!(&mapped, ServiceError::DuplicateBarcode(code) if code == "BC-1"));
    assert_eq!(mapped.status_code(), StatusCode::CONFLICT);

    // Unrelated database failures keep their internal classification.
    assert!(matches!(
        ServiceError::from_asset_write(DbErr::Custom("boom".to_string()), "BC-1"),
        ServiceError::DatabaseError(_)
    ));
}

#[tokio::test]
async fn text_filters_ignore_case() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    ctx.assets
        .create_asset(laptop_request("bc-lower"), actor)
        .await
        .unwrap();

    let mut params = HashMap::new();
    params.insert("barcode".to_string(), "BC-LOWER__iexact".to_string());
    let page = ctx.assets.list_active(&params, 1, 10).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.assets[0].barcode, "bc-lower");

    let mut params = HashMap::new();
    params.insert("description".to_string(), "LAPTOP__icontains".to_string());
    let page = ctx.assets.list_active(&params, 1, 10).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn reference_filters_resolve_display_names() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    ctx.assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();

    let mut params = HashMap::new();
    params.insert("major_category".to_string(), "ICT".to_string());
    let page = ctx.assets.list_active(&params, 1, 10).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.filtered_fields, vec!["major_category"]);

    let mut params = HashMap::new();
    params.insert("department".to_string(), "Finance".to_string());
    assert_eq!(ctx.assets.list_active(&params, 1, 10).await.unwrap().total, 1);

    // An unknown name fails closed: empty result, never an error.
    let mut params = HashMap::new();
    params.insert("department".to_string(), "Marketing".to_string());
    let page = ctx.assets.list_active(&params, 1, 10).await.unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(page.filtered_fields, vec!["department"]);
}

#[tokio::test]
async fn employee_filter_matches_name_tokens() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    ctx.assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();
    let mut unassigned = laptop_request("BC-2");
    unassigned.employee_id = None;
    ctx.assets.create_asset(unassigned, actor).await.unwrap();

    // Tokens match across name parts, regardless of case.
    let mut params = HashMap::new();
    params.insert("employee".to_string(), "grace mwangi".to_string());
    let page = ctx.assets.list_active(&params, 1, 10).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.assets[0].barcode, "BC-1");

    let mut params = HashMap::new();
    params.insert("employee".to_string(), "mwangi".to_string());
    assert_eq!(ctx.assets.list_active(&params, 1, 10).await.unwrap().total, 1);

    // An unmatched name resolves to an empty id set, not an error.
    let mut params = HashMap::new();
    params.insert("employee".to_string(), "Zzz".to_string());
    assert_eq!(ctx.assets.list_active(&params, 1, 10).await.unwrap().total, 0);
}

#[tokio::test]
async fn blank_employee_filter_matches_nothing() {
    let ctx = setup().await;
    let actor = Uuid::new_v4();
    ctx.assets
        .create_asset(laptop_request("BC-1"), actor)
        .await
        .unwrap();

    let mut params = HashMap::new();
    params.insert("employee".to_string(), "   ".to_string());
    let page = ctx.assets.list_active(&params, 1, 10).await.unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn deleting_unknown_asset_is_not_found() {
    let ctx = setup().await;
    assert!(matches!(
        ctx.assets.delete_asset(404).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    // db handle still usable afterwards
    assert!(ctx.db.ping().await.is_ok());
}
