use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use super::catalog::escape_like;
use super::installations::{check_references, insert_installation};
use crate::dto::installation::InstallationPayload;
use crate::dto::{parse_date, FieldErrors, FieldReader};
use crate::entities::{installation, product, technician};
use crate::errors::{ImportError, ServiceError};

/// Serial and order number used when a row leaves them out.
pub const UNKNOWN: &str = "NA";
pub const PLACEHOLDER_PRODUCT_NAME: &str = "Producto Importado";

/// Request body shape. Rows are read as raw JSON so each can fail on its own.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkImportRequest {
    pub instalaciones: Vec<InstallationPayload>,
}

/// Outcome of one bulk import request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkImportReport {
    /// Rows inserted
    pub creadas: u64,
    pub errores: Vec<RowError>,
    /// Rows submitted
    pub total: usize,
}

/// Why a row was not imported. `fila` is 1-based.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum RowError {
    /// The row failed validation
    Invalid {
        fila: usize,
        #[schema(value_type = Object)]
        errores: FieldErrors,
    },
    /// Processing the row raised an unexpected error
    Failed { fila: usize, error: String },
}

impl RowError {
    pub fn fila(&self) -> usize {
        match self {
            Self::Invalid { fila, .. } | Self::Failed { fila, .. } => *fila,
        }
    }
}

/// First `{original}_DUP{n}` (n >= 1) that `is_taken` rejects, or
/// `original` itself when it is free.
pub fn dedupe_numero_ot(original: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(original) {
        return original.to_string();
    }
    (1u64..)
        .map(|n| format!("{}_DUP{}", original, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| original.to_string())
}

/// Text of an identifying field, or `None` when missing, null or blank.
fn identifier(row: &Map<String, Value>, field: &str) -> Option<String> {
    let text = match row.get(field)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Imports spreadsheet rows as installations, one row at a time.
///
/// Rows are independent: a failing row is reported and the rest continue.
/// There is no surrounding transaction, so rows inserted before a failure
/// stay committed.
#[derive(Clone)]
pub struct BulkImportService {
    db: Arc<DatabaseConnection>,
}

impl BulkImportService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, body))]
    pub async fn import(&self, body: &Value) -> Result<BulkImportReport, ImportError> {
        let rows = match body.get("instalaciones") {
            None | Some(Value::Null) => return Err(ImportError::NoRows),
            Some(Value::Array(rows)) if rows.is_empty() => return Err(ImportError::NoRows),
            Some(Value::Array(rows)) => rows,
            Some(_) => return Err(ImportError::NotAList),
        };

        // Owner of placeholder products
        let default_technician = technician::Entity::find()
            .order_by_asc(technician::Column::IdUnicoTecnico)
            .one(self.db.as_ref())
            .await?;

        let mut report = BulkImportReport {
            creadas: 0,
            errores: Vec::new(),
            total: rows.len(),
        };

        for (index, row) in rows.iter().enumerate() {
            let fila = index + 1;
            match self.import_row(row, default_technician.as_ref()).await {
                Ok(Ok(id)) => {
                    debug!(fila, id, "Row imported");
                    report.creadas += 1;
                }
                Ok(Err(errores)) => {
                    debug!(fila, ?errores, "Row rejected");
                    report.errores.push(RowError::Invalid { fila, errores });
                }
                Err(e) => {
                    warn!(fila, error = %e, "Row failed");
                    report.errores.push(RowError::Failed {
                        fila,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            creadas = report.creadas,
            errores = report.errores.len(),
            total = report.total,
            "Bulk import finished"
        );
        Ok(report)
    }

    /// New installation id, or the row's field errors.
    async fn import_row(
        &self,
        row: &Value,
        default_technician: Option<&technician::Model>,
    ) -> Result<Result<i32, FieldErrors>, ServiceError> {
        let Value::Object(fields) = row else {
            return Ok(Err(FieldReader::new(row).err().unwrap_or_default()));
        };
        let mut data = fields.clone();

        let serial = self.resolve_serial(&data, default_technician).await?;
        data.insert("producto_serie".to_string(), Value::String(serial));

        let original_ot = identifier(&data, "numero_ot").unwrap_or_else(|| UNKNOWN.to_string());
        let numero_ot = self.free_numero_ot(&original_ot).await?;
        if numero_ot != original_ot {
            debug!(original = %original_ot, renamed = %numero_ot, "Duplicate order number");
        }
        data.insert("numero_ot".to_string(), Value::String(numero_ot));

        let payload = match InstallationPayload::parse(&Value::Object(data)) {
            Ok(payload) => payload,
            Err(errors) => return Ok(Err(errors)),
        };

        let errors = check_references(self.db.as_ref(), &payload).await?;
        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        let id = insert_installation(self.db.as_ref(), &payload)
            .await
            .map_err(ServiceError::from_db)?;
        Ok(Ok(id))
    }

    /// Serial of an existing or freshly created product, else `"NA"`.
    async fn resolve_serial(
        &self,
        row: &Map<String, Value>,
        default_technician: Option<&technician::Model>,
    ) -> Result<String, ServiceError> {
        let serial = identifier(row, "producto_serie").unwrap_or_else(|| UNKNOWN.to_string());

        let existing = product::Entity::find()
            .filter(product::Column::ProductoSerie.eq(serial.as_str()))
            .one(self.db.as_ref())
            .await?;
        if let Some(product) = existing {
            return Ok(product.producto_serie);
        }

        let fecha = row
            .get("fecha_instalacion")
            .and_then(Value::as_str)
            .and_then(parse_date);
        let (Some(owner), Some(fecha)) = (default_technician, fecha) else {
            return Ok(UNKNOWN.to_string());
        };

        let categoria = identifier(row, "categoria").unwrap_or_else(|| UNKNOWN.to_string());
        let placeholder = product::ActiveModel {
            categoria: Set(categoria),
            nombre_producto: Set(PLACEHOLDER_PRODUCT_NAME.to_string()),
            producto_serie: Set(serial),
            cantidad: Set(1),
            id_tecnico: Set(owner.id_unico_tecnico),
            fecha_asignacion: Set(fecha),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::from_db)?;

        info!(
            producto_serie = %placeholder.producto_serie,
            id_tecnico = owner.id_unico_tecnico,
            "Placeholder product created"
        );
        Ok(placeholder.producto_serie)
    }

    /// `original` or the first free `_DUPn` variant of it.
    async fn free_numero_ot(&self, original: &str) -> Result<String, ServiceError> {
        let taken: HashSet<String> = installation::Entity::find()
            .select_only()
            .column(installation::Column::NumeroOt)
            .filter(
                Condition::any()
                    .add(installation::Column::NumeroOt.eq(original))
                    .add(installation::Column::NumeroOt.like(
                        LikeExpr::new(format!("{}\\_DUP%", escape_like(original))).escape('\\'),
                    )),
            )
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .collect();

        Ok(dedupe_numero_ot(original, |candidate| taken.contains(candidate)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn free_order_number_is_kept() {
        assert_eq!(dedupe_numero_ot("OT-1", |_| false), "OT-1");
    }

    #[test]
    fn first_gap_in_suffixes_is_used() {
        let taken = ["OT-1", "OT-1_DUP1", "OT-1_DUP3"];
        assert_eq!(
            dedupe_numero_ot("OT-1", |c| taken.contains(&c)),
            "OT-1_DUP2"
        );
    }

    #[test]
    fn identifiers_treat_blank_as_missing() {
        let row = json!({"a": "  ", "b": null, "c": 1234, "d": " SN-9 "});
        let row = row.as_object().unwrap();
        assert_eq!(identifier(row, "a"), None);
        assert_eq!(identifier(row, "b"), None);
        assert_eq!(identifier(row, "c").as_deref(), Some("1234"));
        assert_eq!(identifier(row, "d").as_deref(), Some("SN-9"));
        assert_eq!(identifier(row, "missing"), None);
    }

    #[test]
    fn row_errors_serialise_without_tags() {
        let mut errores = FieldErrors::new();
        errores.insert("direccion".into(), vec!["This field is required.".into()]);
        let invalid = serde_json::to_value(RowError::Invalid { fila: 2, errores }).unwrap();
        assert_eq!(
            invalid,
            json!({"fila": 2, "errores": {"direccion": ["This field is required."]}})
        );

        let failed = RowError::Failed {
            fila: 3,
            error: "boom".into(),
        };
        assert_eq!(failed.fila(), 3);
        assert_eq!(
            serde_json::to_value(failed).unwrap(),
            json!({"fila": 3, "error": "boom"})
        );
    }

    proptest! {
        #[test]
        fn dedupe_picks_smallest_free_suffix(
            original in "[A-Z0-9-]{1,12}",
            taken_suffixes in proptest::collection::btree_set(1u64..20, 0..10),
            original_taken in any::<bool>(),
        ) {
            let mut taken: HashSet<String> = taken_suffixes
                .iter()
                .map(|n| format!("{}_DUP{}", original, n))
                .collect();
            if original_taken {
                taken.insert(original.clone());
            }

            let result = dedupe_numero_ot(&original, |c| taken.contains(c));

            prop_assert!(!taken.contains(&result));
            if original_taken {
                let expected = (1u64..).find(|n| !taken_suffixes.contains(n)).unwrap();
                prop_assert_eq!(result, format!("{}_DUP{}", original, expected));
            } else {
                prop_assert_eq!(result, original);
            }
        }
    }
}
