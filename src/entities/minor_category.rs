use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "minor_categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub major_category_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::asset::Entity")]
    Assets,
    #[sea_orm(
        belongs_to = "super::major_category::Entity",
        from = "Column::MajorCategoryId",
        to = "super::major_category::Column::Id"
    )]
    MajorCategory,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assets.def()
    }
}

impl Related<super::major_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MajorCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
