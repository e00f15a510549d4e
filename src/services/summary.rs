//! Register summary statistics and report rows.
//!
//! The summary is an expensive multi-table aggregate, so it is served
//! cache-aside from `asset_summary_cache` with the standard TTL backstop.
//! Report rows are always computed fresh; they are filter-driven exports,
//! not a dashboard view.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::cache::{CacheBackend, AGGREGATE_TTL, ASSET_SUMMARY};
use crate::db::DbPool;
use crate::entities::{
    asset, department, employee, location, major_category, minor_category, supplier,
};
use crate::errors::ServiceError;
use crate::filters;

/// Per-dimension rollup of the active register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub id: i64,
    pub name: String,
    pub asset_count: u64,
    pub net_book_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total_assets: u64,
    pub active_assets: u64,
    pub disposed_assets: u64,
    /// Totals cover the active register only.
    pub total_purchase_price: Decimal,
    pub total_net_book_value: Decimal,
    pub total_accumulated_depreciation: Decimal,
    pub departments: u64,
    pub employees: u64,
    pub suppliers: u64,
    pub locations: u64,
    pub major_categories: u64,
    pub minor_categories: u64,
    pub by_department: Vec<DimensionBreakdown>,
    pub by_location: Vec<DimensionBreakdown>,
    pub by_supplier: Vec<DimensionBreakdown>,
    pub by_major_category: Vec<DimensionBreakdown>,
    pub by_minor_category: Vec<DimensionBreakdown>,
    pub generated_at: DateTime<Utc>,
}

/// One flattened row of the asset report, foreign keys resolved to their
/// display names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub asset_code: String,
    pub barcode: String,
    pub description: String,
    pub asset_type: String,
    pub department: String,
    pub location: String,
    pub major_category: String,
    pub minor_category: String,
    pub supplier: String,
    pub custodian: Option<String>,
    pub purchase_price: Decimal,
    pub net_book_value: Decimal,
    pub accumulated_depreciation: Decimal,
    pub date_of_purchase: chrono::NaiveDate,
    pub condition: String,
    pub status: String,
    pub is_disposed: bool,
}

#[derive(Clone)]
pub struct SummaryService {
    db: Arc<DbPool>,
    cache: Arc<dyn CacheBackend>,
}

impl SummaryService {
    pub fn new(db: Arc<DbPool>, cache: Arc<dyn CacheBackend>) -> Self {
        Self { db, cache }
    }

    /// Returns the summary, from cache when warm. Cache failures degrade
    /// to a fresh computation.
    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<SummaryReport, ServiceError> {
        match self.cache.get(ASSET_SUMMARY).await {
            Ok(Some(raw)) => match serde_json::from_str::<SummaryReport>(&raw) {
                Ok(report) => return Ok(report),
                Err(e) => warn!("Discarding unparseable cached summary: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache read failed: {}", e),
        }

        let report = self.compute_summary().await?;

        match serde_json::to_string(&report) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(ASSET_SUMMARY, &raw, Some(AGGREGATE_TTL)).await {
                    warn!("Cache write failed: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize summary: {}", e),
        }

        Ok(report)
    }

    async fn compute_summary(&self) -> Result<SummaryReport, ServiceError> {
        let db = self.db.as_ref();

        let total_assets = asset::Entity::find().count(db).await?;
        let active = asset::Entity::find()
            .filter(asset::Column::IsDisposed.eq(false))
            .all(db)
            .await?;
        let active_assets = active.len() as u64;
        let disposed_assets = total_assets - active_assets;

        let mut total_purchase_price = Decimal::ZERO;
        let mut total_net_book_value = Decimal::ZERO;
        for entry in &active {
            total_purchase_price += entry.purchase_price;
            total_net_book_value += entry.net_book_value;
        }
        // Report-level accumulation is defined as cost minus carrying
        // value, independent of the per-asset schedule figures.
        let total_accumulated_depreciation = total_purchase_price - total_net_book_value;

        let department_names = name_map::<department::Entity>(db, |m| (m.id, m.name)).await?;
        let location_names = name_map::<location::Entity>(db, |m| (m.id, m.name)).await?;
        let supplier_names = name_map::<supplier::Entity>(db, |m| (m.id, m.name)).await?;
        let major_names = name_map::<major_category::Entity>(db, |m| (m.id, m.name)).await?;
        let minor_names = name_map::<minor_category::Entity>(db, |m| (m.id, m.name)).await?;

        let by_department = breakdown(&active, &department_names, |a| a.department_id);
        let by_location = breakdown(&active, &location_names, |a| a.location_id);
        let by_supplier = breakdown(&active, &supplier_names, |a| a.supplier_id);
        let by_major_category = breakdown(&active, &major_names, |a| a.major_category_id);
        let by_minor_category = breakdown(&active, &minor_names, |a| a.minor_category_id);

        let (departments, employees, suppliers, locations, major_categories, minor_categories) =
            futures::try_join!(
                department::Entity::find().count(db),
                employee::Entity::find().count(db),
                supplier::Entity::find().count(db),
                location::Entity::find().count(db),
                major_category::Entity::find().count(db),
                minor_category::Entity::find().count(db),
            )?;

        Ok(SummaryReport {
            total_assets,
            active_assets,
            disposed_assets,
            total_purchase_price,
            total_net_book_value,
            total_accumulated_depreciation,
            departments,
            employees,
            suppliers,
            locations,
            major_categories,
            minor_categories,
            by_department,
            by_location,
            by_supplier,
            by_major_category,
            by_minor_category,
            generated_at: Utc::now(),
        })
    }

    /// Builds flattened report rows for the given filter parameters.
    /// An empty result is a `NotFound`, matching the report endpoint
    /// contract.
    #[instrument(skip(self, params))]
    pub async fn report_rows(
        &self,
        params: &HashMap<String, String>,
    ) -> Result<Vec<ReportRow>, ServiceError> {
        let db = self.db.as_ref();
        let applied = filters::build_asset_filter(db, params).await?;

        let assets = asset::Entity::find()
            .filter(applied.condition)
            .order_by_asc(asset::Column::AssetCode)
            .all(db)
            .await?;

        if assets.is_empty() {
            return Err(ServiceError::NotFound(
                "No assets match the report criteria".to_string(),
            ));
        }

        let departments = name_map::<department::Entity>(db, |m| (m.id, m.name)).await?;
        let locations = name_map::<location::Entity>(db, |m| (m.id, m.name)).await?;
        let majors = name_map::<major_category::Entity>(db, |m| (m.id, m.name)).await?;
        let minors = name_map::<minor_category::Entity>(db, |m| (m.id, m.name)).await?;
        let suppliers = name_map::<supplier::Entity>(db, |m| (m.id, m.name)).await?;
        let custodians: HashMap<i64, String> = employee::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|e| (e.id, e.full_name()))
            .collect();

        let rows = assets
            .into_iter()
            .map(|a| ReportRow {
                asset_code: a.asset_code,
                barcode: a.barcode,
                description: a.description,
                asset_type: a.asset_type,
                department: resolve(&departments, a.department_id),
                location: resolve(&locations, a.location_id),
                major_category: resolve(&majors, a.major_category_id),
                minor_category: resolve(&minors, a.minor_category_id),
                supplier: resolve(&suppliers, a.supplier_id),
                custodian: a.employee_id.map(|id| resolve(&custodians, id)),
                purchase_price: a.purchase_price,
                net_book_value: a.net_book_value,
                accumulated_depreciation: a.accumulated_depreciation,
                date_of_purchase: a.date_of_purchase,
                condition: a.condition,
                status: a.status,
                is_disposed: a.is_disposed,
            })
            .collect();

        Ok(rows)
    }
}

async fn name_map<E>(
    db: &DbPool,
    to_pair: fn(E::Model) -> (i64, String),
) -> Result<HashMap<i64, String>, ServiceError>
where
    E: EntityTrait,
{
    Ok(E::find()
        .all(db)
        .await?
        .into_iter()
        .map(to_pair)
        .collect())
}

fn resolve(names: &HashMap<i64, String>, id: i64) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("#{}", id))
}

fn breakdown(
    active: &[asset::Model],
    names: &HashMap<i64, String>,
    key: fn(&asset::Model) -> i64,
) -> Vec<DimensionBreakdown> {
    let mut grouped: HashMap<i64, (u64, Decimal)> = HashMap::new();
    for entry in active {
        let slot = grouped.entry(key(entry)).or_default();
        slot.0 += 1;
        slot.1 += entry.net_book_value;
    }

    let mut rows: Vec<DimensionBreakdown> = grouped
        .into_iter()
        .map(|(id, (asset_count, net_book_value))| DimensionBreakdown {
            id,
            name: resolve(names, id),
            asset_count,
            net_book_value,
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}
