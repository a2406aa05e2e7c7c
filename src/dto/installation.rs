use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use super::{decimal_10_2, not_blank, FieldErrors, FieldReader};

/// Columns computed by the database; client values for them are ignored.
pub const DERIVED_FIELDS: [&str; 3] = ["total", "instalacion_compartida", "valor_total_empresa"];

/// Writable installation columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct InstallationPayload {
    pub fecha_instalacion: NaiveDate,
    pub id_tecnico: i32,
    pub id_operador: i32,
    #[validate(custom = "not_blank")]
    #[schema(example = "Calle 10 # 20-30")]
    pub direccion: String,
    #[validate(
        length(max = 50, message = "Ensure this field has no more than 50 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "OT-2024-0001")]
    pub numero_ot: String,
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    pub producto_serie: String,
    pub id_dr: i32,
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub eq_reutilizado: Option<String>,
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub eq_retirado: Option<String>,
    pub id_tipo_orden: i32,
    #[validate(custom = "decimal_10_2")]
    pub metros_cable: Decimal,
    pub id_acometida: i32,
    pub observaciones: Option<String>,
    #[validate(custom = "decimal_10_2")]
    #[serde(rename = "valor_añadido")]
    pub valor_anadido: Option<Decimal>,
    #[validate(custom = "decimal_10_2")]
    pub valor_opcional_empresa: Option<Decimal>,
    #[validate(custom = "decimal_10_2")]
    pub valor_dr: Decimal,
    #[validate(custom = "decimal_10_2")]
    pub valor_orden: Decimal,
    #[validate(custom = "decimal_10_2")]
    pub valor_orden_empresa: Decimal,
    #[validate(custom = "decimal_10_2")]
    pub valor_dr_empresa: Decimal,
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub serie_dr: Option<String>,
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub categoria: Option<String>,
}

impl InstallationPayload {
    pub fn parse(value: &Value) -> Result<Self, FieldErrors> {
        let mut r = FieldReader::new(value)?;
        let payload = Self {
            fecha_instalacion: r.date("fecha_instalacion"),
            id_tecnico: r.pk("id_tecnico"),
            id_operador: r.pk("id_operador"),
            direccion: r.string("direccion"),
            numero_ot: r.string("numero_ot"),
            producto_serie: r.string("producto_serie"),
            id_dr: r.pk("id_dr"),
            eq_reutilizado: r.optional_string("eq_reutilizado"),
            eq_retirado: r.optional_string("eq_retirado"),
            id_tipo_orden: r.pk("id_tipo_orden"),
            metros_cable: r.decimal("metros_cable"),
            id_acometida: r.pk("id_acometida"),
            observaciones: r.optional_string("observaciones"),
            valor_anadido: r.optional_decimal("valor_añadido"),
            valor_opcional_empresa: r.optional_decimal("valor_opcional_empresa"),
            valor_dr: r.decimal("valor_dr"),
            valor_orden: r.decimal("valor_orden"),
            valor_orden_empresa: r.decimal("valor_orden_empresa"),
            valor_dr_empresa: r.decimal("valor_dr_empresa"),
            serie_dr: r.optional_string("serie_dr"),
            categoria: r.optional_string("categoria"),
        };
        r.finish(payload)
    }
}
