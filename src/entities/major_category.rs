use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Major asset category. The category name drives the default economic
/// life assigned to assets created under it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "major_categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::asset::Entity")]
    Assets,
    #[sea_orm(has_many = "super::minor_category::Entity")]
    MinorCategories,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assets.def()
    }
}

impl Related<super::minor_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MinorCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
