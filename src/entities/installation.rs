use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Installation order carried out by a technician (`instalaciones`)
///
/// `total`, `instalacion_compartida` and `valor_total_empresa` are generated
/// by the database; rows are written with explicit column lists that leave
/// them out (see `services::installations`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "instalaciones")]
#[schema(as = Installation)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id_instalacion: i32,
    pub fecha_instalacion: NaiveDate,
    pub id_tecnico: i32,
    pub id_operador: i32,
    #[sea_orm(column_type = "Text")]
    pub direccion: String,
    /// Work order number
    #[sea_orm(unique)]
    pub numero_ot: String,
    pub producto_serie: String,
    pub id_dr: i32,
    pub eq_reutilizado: Option<String>,
    pub eq_retirado: Option<String>,
    pub id_tipo_orden: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub metros_cable: Decimal,
    pub id_acometida: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub observaciones: Option<String>,
    #[serde(rename = "valor_añadido")]
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub valor_anadido: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub valor_opcional_empresa: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub valor_dr: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub valor_orden: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub valor_orden_empresa: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub valor_dr_empresa: Decimal,
    pub serie_dr: Option<String>,
    pub categoria: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub total: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub instalacion_compartida: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub valor_total_empresa: Option<Decimal>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::IdTecnico",
        to = "super::technician::Column::IdUnicoTecnico"
    )]
    Technician,
    #[sea_orm(
        belongs_to = "super::operator::Entity",
        from = "Column::IdOperador",
        to = "super::operator::Column::IdOpe"
    )]
    Operator,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductoSerie",
        to = "super::product::Column::ProductoSerie"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::rate::Entity",
        from = "Column::IdDr",
        to = "super::rate::Column::IdDr"
    )]
    Rate,
    #[sea_orm(
        belongs_to = "super::order_type::Entity",
        from = "Column::IdTipoOrden",
        to = "super::order_type::Column::IdTipoOrden"
    )]
    OrderType,
    #[sea_orm(
        belongs_to = "super::connection_type::Entity",
        from = "Column::IdAcometida",
        to = "super::connection_type::Column::IdAcometida"
    )]
    ConnectionType,
    #[sea_orm(has_many = "super::discount::Entity")]
    Discounts,
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::operator::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Operator.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::rate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rate.def()
    }
}

impl Related<super::order_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderType.def()
    }
}

impl Related<super::connection_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConnectionType.def()
    }
}

impl Related<super::discount::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
