use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Work order category and its prices (`tipodeordenes`)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "tipodeordenes")]
#[schema(as = OrderType)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_tipo_orden: i32,
    pub nombre_orden: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub valor_orden: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub valor_orden_empresa: Decimal,
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
