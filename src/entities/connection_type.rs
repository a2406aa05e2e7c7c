use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Hookup type ("acometida") and its price (`acometidas`)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "acometidas")]
#[schema(as = ConnectionType)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_acometida: i32,
    #[sea_orm(unique)]
    pub nombre_acometida: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub precio: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::installation::Entity")]
    Installations,
}

impl Related<super::installation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
