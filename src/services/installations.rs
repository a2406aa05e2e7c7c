use std::sync::Arc;

use sea_orm::sea_query::{Expr, Query, SimpleExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter,
};
use serde_json::Value;
use tracing::{info, instrument};

use super::catalog::{merge_patch, row_exists};
use crate::dto::installation::InstallationPayload;
use crate::dto::{missing_pk, missing_slug, push_error, FieldErrors};
use crate::entities::{
    connection_type, installation, operator, order_type, product, rate, technician,
};
use crate::errors::ServiceError;

const DUPLICATE_OT: &str = "instalaciones with this numero ot already exists.";

/// Create and update paths for installations.
///
/// Writes never go through the active model: the derived totals are
/// generated columns and must be absent from INSERT and UPDATE statements.
#[derive(Clone)]
pub struct InstallationService {
    db: Arc<DatabaseConnection>,
}

impl InstallationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, body))]
    pub async fn create(&self, body: &Value) -> Result<installation::Model, ServiceError> {
        let payload = self.validate(body, None).await?;
        let id = insert_installation(self.db.as_ref(), &payload)
            .await
            .map_err(ServiceError::from_db)?;

        info!(id, numero_ot = %payload.numero_ot, "Installation created");
        self.fetch(id).await
    }

    #[instrument(skip(self, body))]
    pub async fn update(&self, id: i32, body: &Value) -> Result<installation::Model, ServiceError> {
        self.fetch(id).await?;
        self.write(id, body).await
    }

    #[instrument(skip(self, patch))]
    pub async fn partial_update(
        &self,
        id: i32,
        patch: &Value,
    ) -> Result<installation::Model, ServiceError> {
        let current = self.fetch(id).await?;
        let merged = merge_patch(&current, patch)?;
        self.write(id, &merged).await
    }

    async fn write(&self, id: i32, body: &Value) -> Result<installation::Model, ServiceError> {
        let payload = self.validate(body, Some(id)).await?;
        update_installation(self.db.as_ref(), id, &payload)
            .await
            .map_err(ServiceError::from_db)?;

        info!(id, numero_ot = %payload.numero_ot, "Installation updated");
        self.fetch(id).await
    }

    async fn validate(
        &self,
        body: &Value,
        current_id: Option<i32>,
    ) -> Result<InstallationPayload, ServiceError> {
        let payload = InstallationPayload::parse(body).map_err(ServiceError::FieldValidation)?;

        let mut errors = check_references(self.db.as_ref(), &payload).await?;
        if numero_ot_taken(self.db.as_ref(), &payload.numero_ot, current_id).await? {
            push_error(&mut errors, "numero_ot", DUPLICATE_OT);
        }
        if !errors.is_empty() {
            return Err(ServiceError::FieldValidation(errors));
        }

        Ok(payload)
    }

    async fn fetch(&self, id: i32) -> Result<installation::Model, ServiceError> {
        installation::Entity::find()
            .filter(installation::Column::IdInstalacion.eq(id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Installation {}", id)))
    }
}

async fn numero_ot_taken<C: ConnectionTrait>(
    db: &C,
    numero_ot: &str,
    exclude_id: Option<i32>,
) -> Result<bool, DbErr> {
    let mut query =
        installation::Entity::find().filter(installation::Column::NumeroOt.eq(numero_ot));
    if let Some(id) = exclude_id {
        query = query.filter(installation::Column::IdInstalacion.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

/// Field errors for every referenced row that does not exist.
pub(crate) async fn check_references<C: ConnectionTrait>(
    db: &C,
    payload: &InstallationPayload,
) -> Result<FieldErrors, DbErr> {
    let mut errors = FieldErrors::new();

    let checks = [
        (
            "id_tecnico",
            payload.id_tecnico,
            row_exists::<technician::Entity, _, _>(
                db,
                technician::Column::IdUnicoTecnico,
                payload.id_tecnico,
            )
            .await?,
        ),
        (
            "id_operador",
            payload.id_operador,
            row_exists::<operator::Entity, _, _>(db, operator::Column::IdOpe, payload.id_operador)
                .await?,
        ),
        (
            "id_dr",
            payload.id_dr,
            row_exists::<rate::Entity, _, _>(db, rate::Column::IdDr, payload.id_dr).await?,
        ),
        (
            "id_tipo_orden",
            payload.id_tipo_orden,
            row_exists::<order_type::Entity, _, _>(
                db,
                order_type::Column::IdTipoOrden,
                payload.id_tipo_orden,
            )
            .await?,
        ),
        (
            "id_acometida",
            payload.id_acometida,
            row_exists::<connection_type::Entity, _, _>(
                db,
                connection_type::Column::IdAcometida,
                payload.id_acometida,
            )
            .await?,
        ),
    ];
    for (field, id, exists) in checks {
        if !exists {
            push_error(&mut errors, field, missing_pk(id));
        }
    }

    let serial_exists = row_exists::<product::Entity, _, _>(
        db,
        product::Column::ProductoSerie,
        payload.producto_serie.clone(),
    )
    .await?;
    if !serial_exists {
        push_error(
            &mut errors,
            "producto_serie",
            missing_slug("producto_serie", &payload.producto_serie),
        );
    }

    Ok(errors)
}

fn writable_values(payload: &InstallationPayload) -> Vec<(installation::Column, SimpleExpr)> {
    use installation::Column as C;

    vec![
        (C::FechaInstalacion, payload.fecha_instalacion.into()),
        (C::IdTecnico, payload.id_tecnico.into()),
        (C::IdOperador, payload.id_operador.into()),
        (C::Direccion, payload.direccion.clone().into()),
        (C::NumeroOt, payload.numero_ot.clone().into()),
        (C::ProductoSerie, payload.producto_serie.clone().into()),
        (C::IdDr, payload.id_dr.into()),
        (C::EqReutilizado, payload.eq_reutilizado.clone().into()),
        (C::EqRetirado, payload.eq_retirado.clone().into()),
        (C::IdTipoOrden, payload.id_tipo_orden.into()),
        (C::MetrosCable, payload.metros_cable.into()),
        (C::IdAcometida, payload.id_acometida.into()),
        (C::Observaciones, payload.observaciones.clone().into()),
        (C::ValorAnadido, payload.valor_anadido.into()),
        (C::ValorOpcionalEmpresa, payload.valor_opcional_empresa.into()),
        (C::ValorDr, payload.valor_dr.into()),
        (C::ValorOrden, payload.valor_orden.into()),
        (C::ValorOrdenEmpresa, payload.valor_orden_empresa.into()),
        (C::ValorDrEmpresa, payload.valor_dr_empresa.into()),
        (C::SerieDr, payload.serie_dr.clone().into()),
        (C::Categoria, payload.categoria.clone().into()),
    ]
}

/// Inserts the writable columns and returns the new `id_instalacion`.
pub(crate) async fn insert_installation<C: ConnectionTrait>(
    db: &C,
    payload: &InstallationPayload,
) -> Result<i32, DbErr> {
    let (columns, values): (Vec<_>, Vec<_>) = writable_values(payload).into_iter().unzip();

    let mut stmt = Query::insert();
    stmt.into_table(installation::Entity).columns(columns);
    stmt.values(values)
        .map_err(|e| DbErr::Custom(format!("invalid installation insert: {}", e)))?;

    let backend = db.get_database_backend();
    if db.support_returning() {
        stmt.returning_col(installation::Column::IdInstalacion);
        let row = db
            .query_one(backend.build(&stmt))
            .await?
            .ok_or(DbErr::RecordNotInserted)?;
        row.try_get::<i32>("", "id_instalacion")
    } else {
        let result = db.execute(backend.build(&stmt)).await?;
        i32::try_from(result.last_insert_id())
            .map_err(|e| DbErr::Custom(format!("installation id out of range: {}", e)))
    }
}

/// Overwrites the writable columns of row `id`; returns the affected row count.
pub(crate) async fn update_installation<C: ConnectionTrait>(
    db: &C,
    id: i32,
    payload: &InstallationPayload,
) -> Result<u64, DbErr> {
    let mut stmt = Query::update();
    stmt.table(installation::Entity)
        .values(writable_values(payload))
        .and_where(Expr::col(installation::Column::IdInstalacion).eq(id));

    let backend = db.get_database_backend();
    let result = db.execute(backend.build(&stmt)).await?;
    Ok(result.rows_affected())
}
