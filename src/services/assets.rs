//! Asset lifecycle service.
//!
//! Single write path for register entries: creation (with server-side code
//! allocation and valuation), partial update, the disposal state machine,
//! hard deletion, and the cached active/disposed listings. Every committed
//! write emits an event for the cache invalidator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::asset_code;
use crate::cache::{CacheBackend, ACTIVE_ASSETS, AGGREGATE_TTL, DISPOSED_ASSETS};
use crate::db::DbPool;
use crate::depreciation::{self, DepreciationMethod};
use crate::entities::{asset, major_category};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::filters;

pub const ASSET_TYPES: &[&str] = &["MOVABLE", "IMMOVABLE"];
pub const ASSET_CONDITIONS: &[&str] = &["NEW", "GOOD", "FAIR", "POOR", "OBSOLETE"];
pub const ASSET_STATUSES: &[&str] = &["ACTIVE", "INACTIVE"];

fn default_units() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAssetRequest {
    #[validate(length(min = 1, message = "Barcode cannot be empty"))]
    pub barcode: String,
    pub rfid: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,
    pub serial_number: Option<String>,
    pub model_number: Option<String>,
    pub asset_type: String,
    pub major_category_id: i64,
    pub minor_category_id: i64,
    pub location_id: i64,
    pub department_id: i64,
    pub employee_id: Option<i64>,
    pub supplier_id: i64,
    /// Overrides the life derived from the major category when present.
    pub economic_life: Option<i32>,
    pub purchase_price: Decimal,
    #[serde(default)]
    pub price_is_per_unit: bool,
    #[serde(default = "default_units")]
    pub units: i32,
    pub revalued_amount: Option<Decimal>,
    pub date_of_purchase: NaiveDate,
    pub date_placed_in_service: NaiveDate,
    pub condition: String,
    pub status: String,
    #[serde(default)]
    pub depreciation_method: DepreciationMethod,
}

/// Partial update. Absent fields keep their stored values. A disposal-flag
/// transition routes through the disposal protocol instead of a field merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAssetRequest {
    #[validate(length(min = 1, message = "Barcode cannot be empty"))]
    pub barcode: Option<String>,
    pub rfid: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub model_number: Option<String>,
    pub asset_type: Option<String>,
    pub major_category_id: Option<i64>,
    pub minor_category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub department_id: Option<i64>,
    pub employee_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub economic_life: Option<i32>,
    pub purchase_price: Option<Decimal>,
    pub price_is_per_unit: Option<bool>,
    pub units: Option<i32>,
    pub revalued_amount: Option<Decimal>,
    pub date_of_purchase: Option<NaiveDate>,
    pub date_placed_in_service: Option<NaiveDate>,
    pub condition: Option<String>,
    pub status: Option<String>,
    pub depreciation_method: Option<DepreciationMethod>,
    pub is_disposed: Option<bool>,
}

/// One page of register entries plus the filter fields that were applied.
#[derive(Debug, Serialize)]
pub struct AssetPage {
    pub assets: Vec<asset::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub filtered_fields: Vec<&'static str>,
}

#[derive(Clone)]
pub struct AssetService {
    db: Arc<DbPool>,
    cache: Arc<dyn CacheBackend>,
    event_sender: EventSender,
}

impl AssetService {
    pub fn new(db: Arc<DbPool>, cache: Arc<dyn CacheBackend>, event_sender: EventSender) -> Self {
        Self {
            db,
            cache,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(barcode = %request.barcode))]
    pub async fn create_asset(
        &self,
        request: CreateAssetRequest,
        actor: Uuid,
    ) -> Result<asset::Model, ServiceError> {
        request.validate()?;
        let today = Utc::now().date_naive();
        ensure_choice("asset_type", &request.asset_type, ASSET_TYPES)?;
        ensure_choice("condition", &request.condition, ASSET_CONDITIONS)?;
        ensure_choice("status", &request.status, ASSET_STATUSES)?;
        ensure_financials(
            request.purchase_price,
            request.units,
            request.revalued_amount,
            request.date_of_purchase,
            request.date_placed_in_service,
            today,
        )?;

        let txn = self.db.begin().await?;

        if asset::Entity::find()
            .filter(asset::Column::Barcode.eq(&request.barcode))
            .one(&txn)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateBarcode(request.barcode));
        }

        let economic_life = match request.economic_life {
            Some(life) => life,
            None => {
                let major = require_major_category(&txn, request.major_category_id).await?;
                depreciation::useful_life(&major.name)
            }
        };

        let purchase_price = total_cost(
            request.purchase_price,
            request.price_is_per_unit,
            request.units,
        );
        let valuation = depreciation::depreciate(
            purchase_price,
            economic_life,
            request.date_of_purchase,
            request.depreciation_method,
            today,
        )?;

        let code = self.next_asset_code(&txn).await?;
        let now = Utc::now();
        let barcode = request.barcode.clone();

        let new_asset = asset::ActiveModel {
            id: NotSet,
            asset_code: Set(code),
            barcode: Set(request.barcode),
            rfid: Set(request.rfid),
            description: Set(request.description),
            serial_number: Set(request.serial_number),
            model_number: Set(request.model_number),
            asset_type: Set(request.asset_type),
            major_category_id: Set(request.major_category_id),
            minor_category_id: Set(request.minor_category_id),
            location_id: Set(request.location_id),
            department_id: Set(request.department_id),
            employee_id: Set(request.employee_id),
            supplier_id: Set(request.supplier_id),
            economic_life: Set(economic_life),
            purchase_price: Set(purchase_price),
            price_is_per_unit: Set(request.price_is_per_unit),
            units: Set(request.units),
            net_book_value: Set(valuation.net_book_value),
            accumulated_depreciation: Set(valuation.accumulated_depreciation),
            revalued_amount: Set(request.revalued_amount),
            date_of_purchase: Set(request.date_of_purchase),
            date_placed_in_service: Set(request.date_placed_in_service),
            condition: Set(request.condition),
            status: Set(request.status),
            depreciation_method: Set(request.depreciation_method.as_str().to_string()),
            is_disposed: Set(false),
            disposed_at: Set(None),
            disposed_by: Set(None),
            undisposed_at: Set(None),
            undisposed_by: Set(None),
            created_by: Set(Some(actor)),
            updated_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // The unique index catches the racer the pre-check cannot see.
        let created = new_asset
            .insert(&txn)
            .await
            .map_err(|e| ServiceError::from_asset_write(e, &barcode))?;
        txn.commit().await?;

        self.event_sender
            .send(Event::AssetCreated {
                asset_id: created.id,
                disposed: false,
            })
            .await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_asset(&self, id: i64) -> Result<asset::Model, ServiceError> {
        asset::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Asset {} not found", id)))
    }

    #[instrument(skip(self, request))]
    pub async fn update_asset(
        &self,
        id: i64,
        request: UpdateAssetRequest,
        actor: Uuid,
    ) -> Result<asset::Model, ServiceError> {
        request.validate()?;

        let existing = self.get_asset(id).await?;

        // A flipped disposal flag is a lifecycle transition, not a merge.
        if let Some(flag) = request.is_disposed {
            if flag != existing.is_disposed {
                return if flag {
                    self.dispose_asset(id, actor).await
                } else {
                    self.undispose_asset(id, actor).await
                };
            }
        }

        let disposed = existing.is_disposed;
        let mut active: asset::ActiveModel = existing.clone().into();

        let today = Utc::now().date_naive();

        let asset_type = request.asset_type.unwrap_or(existing.asset_type);
        let condition = request.condition.unwrap_or(existing.condition);
        let status = request.status.unwrap_or(existing.status);
        ensure_choice("asset_type", &asset_type, ASSET_TYPES)?;
        ensure_choice("condition", &condition, ASSET_CONDITIONS)?;
        ensure_choice("status", &status, ASSET_STATUSES)?;

        let units = request.units.unwrap_or(existing.units);
        let price_is_per_unit = request
            .price_is_per_unit
            .unwrap_or(existing.price_is_per_unit);
        // The stored price is already the total; only a freshly supplied
        // price can be per unit.
        let purchase_price = match request.purchase_price {
            Some(price) => total_cost(price, price_is_per_unit, units),
            None => existing.purchase_price,
        };
        let revalued_amount = request.revalued_amount.or(existing.revalued_amount);
        let date_of_purchase = request.date_of_purchase.unwrap_or(existing.date_of_purchase);
        let date_placed_in_service = request
            .date_placed_in_service
            .unwrap_or(existing.date_placed_in_service);
        ensure_financials(
            purchase_price,
            units,
            revalued_amount,
            date_of_purchase,
            date_placed_in_service,
            today,
        )?;

        let method = match request.depreciation_method {
            Some(method) => method,
            None => DepreciationMethod::parse(&existing.depreciation_method).ok_or_else(|| {
                ServiceError::database_error_message(format!(
                    "asset {} has invalid stored depreciation method {:?}",
                    id, existing.depreciation_method
                ))
            })?,
        };

        let txn = self.db.begin().await?;

        let barcode = match request.barcode {
            Some(barcode) if barcode != existing.barcode => {
                let taken = asset::Entity::find()
                    .filter(asset::Column::Barcode.eq(&barcode))
                    .filter(asset::Column::Id.ne(id))
                    .one(&txn)
                    .await?
                    .is_some();
                if taken {
                    return Err(ServiceError::DuplicateBarcode(barcode));
                }
                barcode
            }
            Some(barcode) => barcode,
            None => existing.barcode.clone(),
        };

        let major_category_id = request
            .major_category_id
            .unwrap_or(existing.major_category_id);
        let economic_life = match request.economic_life {
            Some(life) => life,
            None if major_category_id != existing.major_category_id => {
                let major = require_major_category(&txn, major_category_id).await?;
                depreciation::useful_life(&major.name)
            }
            None => existing.economic_life,
        };

        let valuation =
            depreciation::depreciate(purchase_price, economic_life, date_of_purchase, method, today)?;

        active.barcode = Set(barcode.clone());
        active.rfid = Set(request.rfid.or(existing.rfid));
        active.description = Set(request.description.unwrap_or(existing.description));
        active.serial_number = Set(request.serial_number.or(existing.serial_number));
        active.model_number = Set(request.model_number.or(existing.model_number));
        active.asset_type = Set(asset_type);
        active.major_category_id = Set(major_category_id);
        active.minor_category_id = Set(request
            .minor_category_id
            .unwrap_or(existing.minor_category_id));
        active.location_id = Set(request.location_id.unwrap_or(existing.location_id));
        active.department_id = Set(request.department_id.unwrap_or(existing.department_id));
        active.employee_id = Set(request.employee_id.or(existing.employee_id));
        active.supplier_id = Set(request.supplier_id.unwrap_or(existing.supplier_id));
        active.economic_life = Set(economic_life);
        active.purchase_price = Set(purchase_price);
        active.price_is_per_unit = Set(price_is_per_unit);
        active.units = Set(units);
        active.net_book_value = Set(valuation.net_book_value);
        active.accumulated_depreciation = Set(valuation.accumulated_depreciation);
        active.revalued_amount = Set(revalued_amount);
        active.date_of_purchase = Set(date_of_purchase);
        active.date_placed_in_service = Set(date_placed_in_service);
        active.condition = Set(condition);
        active.status = Set(status);
        active.depreciation_method = Set(method.as_str().to_string());
        active.updated_by = Set(Some(actor));
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::from_asset_write(e, &barcode))?;
        txn.commit().await?;

        self.event_sender
            .send(Event::AssetUpdated {
                asset_id: updated.id,
                disposed,
            })
            .await;

        Ok(updated)
    }

    /// Marks an asset disposed. Disposing twice is a conflict.
    #[instrument(skip(self))]
    pub async fn dispose_asset(&self, id: i64, actor: Uuid) -> Result<asset::Model, ServiceError> {
        let existing = self.get_asset(id).await?;
        if existing.is_disposed {
            return Err(ServiceError::AlreadyDisposed(existing.asset_code));
        }

        let now = Utc::now();
        let mut active: asset::ActiveModel = existing.into();
        active.is_disposed = Set(true);
        active.disposed_at = Set(Some(now));
        active.disposed_by = Set(Some(actor));
        active.undisposed_at = Set(None);
        active.undisposed_by = Set(None);
        active.updated_by = Set(Some(actor));
        active.updated_at = Set(now);

        let disposed = active.update(self.db.as_ref()).await?;

        self.event_sender
            .send(Event::AssetUpdated {
                asset_id: disposed.id,
                disposed: true,
            })
            .await;

        Ok(disposed)
    }

    /// Returns a disposed asset to the active register. Only valid for
    /// disposed assets.
    #[instrument(skip(self))]
    pub async fn undispose_asset(&self, id: i64, actor: Uuid) -> Result<asset::Model, ServiceError> {
        let existing = self.get_asset(id).await?;
        if !existing.is_disposed {
            return Err(ServiceError::NotDisposed(existing.asset_code));
        }

        let now = Utc::now();
        let mut active: asset::ActiveModel = existing.into();
        active.is_disposed = Set(false);
        active.disposed_at = Set(None);
        active.disposed_by = Set(None);
        active.undisposed_at = Set(Some(now));
        active.undisposed_by = Set(Some(actor));
        active.updated_by = Set(Some(actor));
        active.updated_at = Set(now);

        let restored = active.update(self.db.as_ref()).await?;

        self.event_sender
            .send(Event::AssetUpdated {
                asset_id: restored.id,
                disposed: false,
            })
            .await;

        Ok(restored)
    }

    #[instrument(skip(self))]
    pub async fn delete_asset(&self, id: i64) -> Result<(), ServiceError> {
        let existing = self.get_asset(id).await?;
        let disposed = existing.is_disposed;

        asset::Entity::delete_by_id(id).exec(self.db.as_ref()).await?;

        self.event_sender
            .send(Event::AssetDeleted {
                asset_id: id,
                disposed,
            })
            .await;

        Ok(())
    }

    /// Lists non-disposed assets, filtered and paginated. The id list is
    /// served from `active_assets` when warm.
    #[instrument(skip(self, params))]
    pub async fn list_active(
        &self,
        params: &HashMap<String, String>,
        page: u64,
        per_page: u64,
    ) -> Result<AssetPage, ServiceError> {
        let ids = self.cached_id_list(ACTIVE_ASSETS, false).await?;
        self.list_page(ids, false, params, page, per_page).await
    }

    /// Lists disposed assets, filtered and paginated, backed by the
    /// `disposed_assets` id list.
    #[instrument(skip(self, params))]
    pub async fn list_disposed(
        &self,
        params: &HashMap<String, String>,
        page: u64,
        per_page: u64,
    ) -> Result<AssetPage, ServiceError> {
        let ids = self.cached_id_list(DISPOSED_ASSETS, true).await?;
        self.list_page(ids, true, params, page, per_page).await
    }

    async fn list_page(
        &self,
        ids: Vec<i64>,
        disposed: bool,
        params: &HashMap<String, String>,
        page: u64,
        per_page: u64,
    ) -> Result<AssetPage, ServiceError> {
        let applied = filters::build_asset_filter(self.db.as_ref(), params).await?;

        let base = Condition::all()
            .add(asset::Column::IsDisposed.eq(disposed))
            .add(asset::Column::Id.is_in(ids));

        let paginator = asset::Entity::find()
            .filter(base)
            .filter(applied.condition)
            .order_by_asc(asset::Column::Id)
            .paginate(self.db.as_ref(), per_page);

        let total = paginator.num_items().await?;
        let assets = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok(AssetPage {
            assets,
            total,
            page,
            per_page,
            filtered_fields: applied.fields,
        })
    }

    /// Reads the cached id list for the given disposal state, rebuilding
    /// and re-caching it on a miss. Cache failures degrade to a direct
    /// query.
    async fn cached_id_list(&self, key: &str, disposed: bool) -> Result<Vec<i64>, ServiceError> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<i64>>(&raw) {
                Ok(ids) => return Ok(ids),
                Err(e) => warn!(key, "Discarding unparseable cached id list: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!(key, "Cache read failed: {}", e),
        }

        let ids: Vec<i64> = asset::Entity::find()
            .select_only()
            .column(asset::Column::Id)
            .filter(asset::Column::IsDisposed.eq(disposed))
            .order_by_asc(asset::Column::Id)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        match serde_json::to_string(&ids) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(key, &raw, Some(AGGREGATE_TTL)).await {
                    warn!(key, "Cache write failed: {}", e);
                }
            }
            Err(e) => warn!(key, "Failed to serialize id list: {}", e),
        }

        Ok(ids)
    }

    /// Allocates the next code in the register sequence. The newest row by
    /// id holds the highest suffix; an unparseable stored code aborts the
    /// allocation.
    async fn next_asset_code<C: ConnectionTrait>(&self, conn: &C) -> Result<String, ServiceError> {
        let last = asset::Entity::find()
            .order_by_desc(asset::Column::Id)
            .one(conn)
            .await?;

        let last_suffix = match &last {
            Some(existing) => Some(asset_code::parse_suffix(&existing.asset_code)?),
            None => None,
        };

        Ok(asset_code::next_code(last_suffix))
    }
}

async fn require_major_category<C: ConnectionTrait>(
    conn: &C,
    id: i64,
) -> Result<major_category::Model, ServiceError> {
    major_category::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::ValidationError(format!("Major category {} not found", id)))
}

/// Resolves a quoted price to the total cost basis.
fn total_cost(price: Decimal, price_is_per_unit: bool, units: i32) -> Decimal {
    if price_is_per_unit {
        price * Decimal::from(units)
    } else {
        price
    }
}

fn ensure_choice(field: &str, value: &str, allowed: &[&str]) -> Result<(), ServiceError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(format!(
            "{} must be one of {:?}, got {:?}",
            field, allowed, value
        )))
    }
}

fn ensure_financials(
    purchase_price: Decimal,
    units: i32,
    revalued_amount: Option<Decimal>,
    date_of_purchase: NaiveDate,
    date_placed_in_service: NaiveDate,
    today: NaiveDate,
) -> Result<(), ServiceError> {
    if purchase_price < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Purchase price cannot be negative".to_string(),
        ));
    }
    if units <= 0 {
        return Err(ServiceError::ValidationError(
            "Units must be positive".to_string(),
        ));
    }
    if let Some(amount) = revalued_amount {
        if amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Revalued amount cannot be negative".to_string(),
            ));
        }
    }
    if date_of_purchase > today {
        return Err(ServiceError::ValidationError(
            "Date of purchase cannot be in the future".to_string(),
        ));
    }
    if date_placed_in_service > today {
        return Err(ServiceError::ValidationError(
            "Date placed in service cannot be in the future".to_string(),
        ));
    }
    Ok(())
}
