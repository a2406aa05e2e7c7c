use async_trait::async_trait;
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, DatabaseConnection, DbErr, QueryFilter, QueryOrder, Select,
};
use serde_json::Value;

use super::{row_exists, ListFilters, Resource, WritableResource};
use crate::dto::catalog::{
    ConnectionTypePayload, DiscountPayload, OperatorPayload, OrderTypePayload, ProductPayload,
    RatePayload, TechnicianPayload,
};
use crate::dto::{missing_pk, push_error, FieldErrors};
use crate::entities::{
    connection_type, discount, installation, operator, order_type, product, rate, technician,
};

pub struct Technicians;

impl Resource for Technicians {
    type Entity = technician::Entity;
    type Model = technician::Model;
    type Column = technician::Column;

    const LABEL: &'static str = "Technician";

    fn primary_key() -> Self::Column {
        technician::Column::IdUnicoTecnico
    }

    fn search_columns() -> Vec<Self::Column> {
        vec![
            technician::Column::Nombre,
            technician::Column::Apellido,
            technician::Column::IdTecnico,
        ]
    }
}

impl WritableResource for Technicians {
    type Payload = TechnicianPayload;
    type ActiveModel = technician::ActiveModel;

    fn parse(body: &Value) -> Result<Self::Payload, FieldErrors> {
        TechnicianPayload::parse(body)
    }

    fn into_active_model(payload: Self::Payload, id: Option<i32>) -> Self::ActiveModel {
        technician::ActiveModel {
            id_unico_tecnico: id.map_or(NotSet, Set),
            nombre: Set(payload.nombre),
            apellido: Set(payload.apellido),
            id_tecnico: Set(payload.id_tecnico),
        }
    }
}

pub struct Operators;

impl Resource for Operators {
    type Entity = operator::Entity;
    type Model = operator::Model;
    type Column = operator::Column;

    const LABEL: &'static str = "Operator";

    fn primary_key() -> Self::Column {
        operator::Column::IdOpe
    }

    fn search_columns() -> Vec<Self::Column> {
        vec![operator::Column::NombreOperador]
    }
}

impl WritableResource for Operators {
    type Payload = OperatorPayload;
    type ActiveModel = operator::ActiveModel;

    fn parse(body: &Value) -> Result<Self::Payload, FieldErrors> {
        OperatorPayload::parse(body)
    }

    fn into_active_model(payload: Self::Payload, id: Option<i32>) -> Self::ActiveModel {
        operator::ActiveModel {
            id_ope: id.map_or(NotSet, Set),
            nombre_operador: Set(payload.nombre_operador),
        }
    }
}

pub struct Products;

impl Resource for Products {
    type Entity = product::Entity;
    type Model = product::Model;
    type Column = product::Column;

    const LABEL: &'static str = "Product";

    fn primary_key() -> Self::Column {
        product::Column::IdProducto
    }

    fn search_columns() -> Vec<Self::Column> {
        vec![
            product::Column::NombreProducto,
            product::Column::ProductoSerie,
            product::Column::Categoria,
        ]
    }

    fn filter(select: Select<Self::Entity>, filters: &ListFilters) -> Select<Self::Entity> {
        match filters.id_tecnico {
            Some(id) => select.filter(product::Column::IdTecnico.eq(id)),
            None => select,
        }
    }

    fn order(select: Select<Self::Entity>) -> Select<Self::Entity> {
        select
            .order_by_desc(product::Column::FechaAsignacion)
            .order_by_desc(product::Column::IdProducto)
    }
}

#[async_trait]
impl WritableResource for Products {
    type Payload = ProductPayload;
    type ActiveModel = product::ActiveModel;

    fn parse(body: &Value) -> Result<Self::Payload, FieldErrors> {
        ProductPayload::parse(body)
    }

    fn into_active_model(payload: Self::Payload, id: Option<i32>) -> Self::ActiveModel {
        product::ActiveModel {
            id_producto: id.map_or(NotSet, Set),
            categoria: Set(payload.categoria),
            nombre_producto: Set(payload.nombre_producto),
            producto_serie: Set(payload.producto_serie),
            cantidad: Set(payload.cantidad),
            id_tecnico: Set(payload.id_tecnico),
            fecha_asignacion: Set(payload.fecha_asignacion),
        }
    }

    async fn check_references(
        db: &DatabaseConnection,
        payload: &Self::Payload,
        errors: &mut FieldErrors,
    ) -> Result<(), DbErr> {
        if !row_exists::<technician::Entity, _, _>(
            db,
            technician::Column::IdUnicoTecnico,
            payload.id_tecnico,
        )
        .await?
        {
            push_error(errors, "id_tecnico", missing_pk(payload.id_tecnico));
        }
        Ok(())
    }
}

pub struct Rates;

impl Resource for Rates {
    type Entity = rate::Entity;
    type Model = rate::Model;
    type Column = rate::Column;

    const LABEL: &'static str = "Rate";

    fn primary_key() -> Self::Column {
        rate::Column::IdDr
    }

    fn search_columns() -> Vec<Self::Column> {
        vec![rate::Column::NombreDr]
    }
}

impl WritableResource for Rates {
    type Payload = RatePayload;
    type ActiveModel = rate::ActiveModel;

    fn parse(body: &Value) -> Result<Self::Payload, FieldErrors> {
        RatePayload::parse(body)
    }

    fn into_active_model(payload: Self::Payload, id: Option<i32>) -> Self::ActiveModel {
        rate::ActiveModel {
            id_dr: id.map_or(NotSet, Set),
            nombre_dr: Set(payload.nombre_dr),
            valor_dr: Set(payload.valor_dr),
            valor_dr_empresa: Set(payload.valor_dr_empresa),
        }
    }
}

pub struct ConnectionTypes;

impl Resource for ConnectionTypes {
    type Entity = connection_type::Entity;
    type Model = connection_type::Model;
    type Column = connection_type::Column;

    const LABEL: &'static str = "ConnectionType";

    fn primary_key() -> Self::Column {
        connection_type::Column::IdAcometida
    }

    fn search_columns() -> Vec<Self::Column> {
        vec![connection_type::Column::NombreAcometida]
    }
}

impl WritableResource for ConnectionTypes {
    type Payload = ConnectionTypePayload;
    type ActiveModel = connection_type::ActiveModel;

    fn parse(body: &Value) -> Result<Self::Payload, FieldErrors> {
        ConnectionTypePayload::parse(body)
    }

    fn into_active_model(payload: Self::Payload, id: Option<i32>) -> Self::ActiveModel {
        connection_type::ActiveModel {
            id_acometida: id.map_or(NotSet, Set),
            nombre_acometida: Set(payload.nombre_acometida),
            precio: Set(payload.precio),
        }
    }
}

pub struct OrderTypes;

impl Resource for OrderTypes {
    type Entity = order_type::Entity;
    type Model = order_type::Model;
    type Column = order_type::Column;

    const LABEL: &'static str = "OrderType";

    fn primary_key() -> Self::Column {
        order_type::Column::IdTipoOrden
    }

    fn search_columns() -> Vec<Self::Column> {
        vec![order_type::Column::NombreOrden]
    }
}

impl WritableResource for OrderTypes {
    type Payload = OrderTypePayload;
    type ActiveModel = order_type::ActiveModel;

    fn parse(body: &Value) -> Result<Self::Payload, FieldErrors> {
        OrderTypePayload::parse(body)
    }

    fn into_active_model(payload: Self::Payload, id: Option<i32>) -> Self::ActiveModel {
        order_type::ActiveModel {
            id_tipo_orden: id.map_or(NotSet, Set),
            nombre_orden: Set(payload.nombre_orden),
            valor_orden: Set(payload.valor_orden),
            valor_orden_empresa: Set(payload.valor_orden_empresa),
        }
    }
}

pub struct Discounts;

impl Resource for Discounts {
    type Entity = discount::Entity;
    type Model = discount::Model;
    type Column = discount::Column;

    const LABEL: &'static str = "Discount";

    fn primary_key() -> Self::Column {
        discount::Column::IdDescuento
    }
}

#[async_trait]
impl WritableResource for Discounts {
    type Payload = DiscountPayload;
    type ActiveModel = discount::ActiveModel;

    fn parse(body: &Value) -> Result<Self::Payload, FieldErrors> {
        DiscountPayload::parse(body)
    }

    fn into_active_model(payload: Self::Payload, id: Option<i32>) -> Self::ActiveModel {
        discount::ActiveModel {
            id_descuento: id.map_or(NotSet, Set),
            valor_descuento: Set(payload.valor_descuento),
            id_instalacion: Set(payload.id_instalacion),
        }
    }

    async fn check_references(
        db: &DatabaseConnection,
        payload: &Self::Payload,
        errors: &mut FieldErrors,
    ) -> Result<(), DbErr> {
        if !row_exists::<installation::Entity, _, _>(
            db,
            installation::Column::IdInstalacion,
            payload.id_instalacion,
        )
        .await?
        {
            push_error(errors, "id_instalacion", missing_pk(payload.id_instalacion));
        }
        Ok(())
    }
}

/// Installations are read and deleted generically; writes go through
/// [`crate::services::installations::InstallationService`].
pub struct Installations;

impl Resource for Installations {
    type Entity = installation::Entity;
    type Model = installation::Model;
    type Column = installation::Column;

    const LABEL: &'static str = "Installation";

    fn primary_key() -> Self::Column {
        installation::Column::IdInstalacion
    }

    fn search_columns() -> Vec<Self::Column> {
        vec![
            installation::Column::NumeroOt,
            installation::Column::Direccion,
            installation::Column::ProductoSerie,
        ]
    }

    fn filter(select: Select<Self::Entity>, filters: &ListFilters) -> Select<Self::Entity> {
        let mut select = select;
        if let Some(id) = filters.id_tecnico {
            select = select.filter(installation::Column::IdTecnico.eq(id));
        }
        if let Some(id) = filters.id_operador {
            select = select.filter(installation::Column::IdOperador.eq(id));
        }
        if let Some(from) = filters.fecha_inicio {
            select = select.filter(installation::Column::FechaInstalacion.gte(from));
        }
        if let Some(to) = filters.fecha_fin {
            select = select.filter(installation::Column::FechaInstalacion.lte(to));
        }
        select
    }

    fn order(select: Select<Self::Entity>) -> Select<Self::Entity> {
        select
            .order_by_desc(installation::Column::FechaInstalacion)
            .order_by_desc(installation::Column::IdInstalacion)
    }
}
