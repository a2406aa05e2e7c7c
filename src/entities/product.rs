use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Serialised equipment assigned to a technician (`productos`)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "productos")]
#[schema(as = Product)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_producto: i32,
    pub categoria: String,
    pub nombre_producto: String,
    /// Serial number; installations reference products by this value
    #[sea_orm(unique)]
    pub producto_serie: String,
    pub cantidad: i32,
    pub id_tecnico: i32,
    pub fecha_asignacion: NaiveDate,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::IdTecnico",
        to = "super::technician::Column::IdUnicoTecnico"
    )]
    Technician,
    #[sea_orm(has_many = "super::installation::Entity")]
    Installations,
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::installation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
