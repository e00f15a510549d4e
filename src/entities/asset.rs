use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The central register entry. `asset_code`, `net_book_value` and
/// `accumulated_depreciation` are derived server-side and never accepted
/// from clients.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub asset_code: String,
    #[sea_orm(unique)]
    pub barcode: String,
    pub rfid: Option<String>,
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
    pub economic_life: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub purchase_price: Decimal,
    pub price_is_per_unit: bool,
    pub units: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub net_book_value: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub accumulated_depreciation: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub revalued_amount: Option<Decimal>,
    pub date_of_purchase: NaiveDate,
    pub date_placed_in_service: NaiveDate,
    pub condition: String,
    pub status: String,
    pub depreciation_method: String,
    pub is_disposed: bool,
    pub disposed_at: Option<DateTime<Utc>>,
    pub disposed_by: Option<Uuid>,
    pub undisposed_at: Option<DateTime<Utc>>,
    pub undisposed_by: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::major_category::Entity",
        from = "Column::MajorCategoryId",
        to = "super::major_category::Column::Id"
    )]
    MajorCategory,
    #[sea_orm(
        belongs_to = "super::minor_category::Entity",
        from = "Column::MinorCategoryId",
        to = "super::minor_category::Column::Id"
    )]
    MinorCategory,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id"
    )]
    Location,
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
}

impl Related<super::major_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MajorCategory.def()
    }
}

impl Related<super::minor_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MinorCategory.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
