use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Network operator the installation was done for (`operadores`)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "operadores")]
#[schema(as = Operator)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_ope: i32,
    #[sea_orm(unique)]
    pub nombre_operador: String,
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
