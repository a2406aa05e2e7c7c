use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "descuentos")]
#[schema(as = Discount)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_descuento: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub valor_descuento: Decimal,
    pub id_instalacion: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::installation::Entity",
        from = "Column::IdInstalacion",
        to = "super::installation::Column::IdInstalacion"
    )]
    Installation,
}

impl Related<super::installation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
