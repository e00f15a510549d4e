//! Bulk asset import.
//!
//! Rows carrying no asset code (or the `DEFAULT` placeholder) become new
//! register entries; rows naming an existing code update that entry. Bad
//! rows never abort the run: each failure is recorded in a conflict log
//! and the import moves on.

use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::asset;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::assets::{AssetService, CreateAssetRequest, UpdateAssetRequest};

/// Placeholder code meaning "allocate a fresh one".
const DEFAULT_CODE: &str = "DEFAULT";

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(flatten)]
    pub details: CreateAssetRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportConflict {
    /// Zero-based position of the row in the submitted batch.
    pub row: usize,
    pub asset_code: Option<String>,
    pub barcode: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    pub created: usize,
    pub updated: usize,
    pub conflicts: Vec<ImportConflict>,
}

#[derive(Clone)]
pub struct ImportService {
    db: Arc<DbPool>,
    assets: AssetService,
    event_sender: EventSender,
}

impl ImportService {
    pub fn new(db: Arc<DbPool>, assets: AssetService, event_sender: EventSender) -> Self {
        Self {
            db,
            assets,
            event_sender,
        }
    }

    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn import_assets(
        &self,
        rows: Vec<ImportRow>,
        actor: Uuid,
    ) -> Result<ImportOutcome, ServiceError> {
        let mut created = 0usize;
        let mut updated = 0usize;
        let mut conflicts = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            let code = row
                .asset_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty() && *c != DEFAULT_CODE);

            let barcode = row.details.barcode.clone();
            let result = match code {
                None => self
                    .assets
                    .create_asset(row.details, actor)
                    .await
                    .map(|_| &mut created),
                Some(code) => self.update_by_code(code, &row.details, actor).await.map(|_| &mut updated),
            };

            match result {
                Ok(counter) => *counter += 1,
                Err(e) => conflicts.push(ImportConflict {
                    row: index,
                    asset_code: row.asset_code.clone(),
                    barcode,
                    message: e.to_string(),
                }),
            }
        }

        info!(
            created,
            updated,
            conflicts = conflicts.len(),
            "Asset import finished"
        );

        self.event_sender
            .send(Event::ImportCompleted { created, updated })
            .await;

        Ok(ImportOutcome {
            created,
            updated,
            conflicts,
        })
    }

    async fn update_by_code(
        &self,
        code: &str,
        details: &CreateAssetRequest,
        actor: Uuid,
    ) -> Result<asset::Model, ServiceError> {
        let existing = asset::Entity::find()
            .filter(asset::Column::AssetCode.eq(code))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Asset code {} not found", code)))?;

        let request = UpdateAssetRequest {
            barcode: Some(details.barcode.clone()),
            rfid: details.rfid.clone(),
            description: Some(details.description.clone()),
            serial_number: details.serial_number.clone(),
            model_number: details.model_number.clone(),
            asset_type: Some(details.asset_type.clone()),
            major_category_id: Some(details.major_category_id),
            minor_category_id: Some(details.minor_category_id),
            location_id: Some(details.location_id),
            department_id: Some(details.department_id),
            employee_id: details.employee_id,
            supplier_id: Some(details.supplier_id),
            economic_life: details.economic_life,
            purchase_price: Some(details.purchase_price),
            price_is_per_unit: Some(details.price_is_per_unit),
            units: Some(details.units),
            revalued_amount: details.revalued_amount,
            date_of_purchase: Some(details.date_of_purchase),
            date_placed_in_service: Some(details.date_placed_in_service),
            condition: Some(details.condition.clone()),
            status: Some(details.status.clone()),
            depreciation_method: Some(details.depreciation_method),
            is_disposed: None,
        };

        self.assets.update_asset(existing.id, request, actor).await
    }
}
