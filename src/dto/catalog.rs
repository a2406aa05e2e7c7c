use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use super::{decimal_10_2, not_blank, FieldErrors, FieldReader};

/// Body for creating or replacing a technician
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct TechnicianPayload {
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "Juan")]
    pub nombre: String,
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "Pérez")]
    pub apellido: String,
    #[validate(
        length(max = 50, message = "Ensure this field has no more than 50 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "TEC-001")]
    pub id_tecnico: String,
}

impl TechnicianPayload {
    pub fn parse(value: &Value) -> Result<Self, FieldErrors> {
        let mut r = FieldReader::new(value)?;
        let payload = Self {
            nombre: r.string("nombre"),
            apellido: r.string("apellido"),
            id_tecnico: r.string("id_tecnico"),
        };
        r.finish(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OperatorPayload {
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "Movistar")]
    pub nombre_operador: String,
}

impl OperatorPayload {
    pub fn parse(value: &Value) -> Result<Self, FieldErrors> {
        let mut r = FieldReader::new(value)?;
        let payload = Self {
            nombre_operador: r.string("nombre_operador"),
        };
        r.finish(payload)
    }
}

/// Body for creating or replacing a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ProductPayload {
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "ONT")]
    pub categoria: String,
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "Router Huawei HG8145")]
    pub nombre_producto: String,
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "48575443A1B2C3D4")]
    pub producto_serie: String,
    pub cantidad: i32,
    /// Owning technician (`tecnicos.id_unico_tecnico`)
    pub id_tecnico: i32,
    pub fecha_asignacion: NaiveDate,
}

impl ProductPayload {
    pub fn parse(value: &Value) -> Result<Self, FieldErrors> {
        let mut r = FieldReader::new(value)?;
        let payload = Self {
            categoria: r.string("categoria"),
            nombre_producto: r.string("nombre_producto"),
            producto_serie: r.string("producto_serie"),
            cantidad: r.integer("cantidad"),
            id_tecnico: r.pk("id_tecnico"),
            fecha_asignacion: r.date("fecha_asignacion"),
        };
        r.finish(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct RatePayload {
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "DR Urbano")]
    pub nombre_dr: String,
    #[validate(custom = "decimal_10_2")]
    pub valor_dr: Decimal,
    #[validate(custom = "decimal_10_2")]
    pub valor_dr_empresa: Decimal,
}

impl RatePayload {
    pub fn parse(value: &Value) -> Result<Self, FieldErrors> {
        let mut r = FieldReader::new(value)?;
        let payload = Self {
            nombre_dr: r.string("nombre_dr"),
            valor_dr: r.decimal("valor_dr"),
            valor_dr_empresa: r.decimal("valor_dr_empresa"),
        };
        r.finish(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ConnectionTypePayload {
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "Aérea")]
    pub nombre_acometida: String,
    #[validate(custom = "decimal_10_2")]
    pub precio: Decimal,
}

impl ConnectionTypePayload {
    pub fn parse(value: &Value) -> Result<Self, FieldErrors> {
        let mut r = FieldReader::new(value)?;
        let payload = Self {
            nombre_acometida: r.string("nombre_acometida"),
            precio: r.decimal("precio"),
        };
        r.finish(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderTypePayload {
    #[validate(
        length(max = 100, message = "Ensure this field has no more than 100 characters."),
        custom = "not_blank"
    )]
    #[schema(example = "Alta nueva")]
    pub nombre_orden: String,
    #[validate(custom = "decimal_10_2")]
    pub valor_orden: Decimal,
    #[validate(custom = "decimal_10_2")]
    pub valor_orden_empresa: Decimal,
}

impl OrderTypePayload {
    pub fn parse(value: &Value) -> Result<Self, FieldErrors> {
        let mut r = FieldReader::new(value)?;
        let payload = Self {
            nombre_orden: r.string("nombre_orden"),
            valor_orden: r.decimal("valor_orden"),
            valor_orden_empresa: r.decimal("valor_orden_empresa"),
        };
        r.finish(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct DiscountPayload {
    #[validate(custom = "decimal_10_2")]
    pub valor_descuento: Decimal,
    pub id_instalacion: i32,
}

impl DiscountPayload {
    pub fn parse(value: &Value) -> Result<Self, FieldErrors> {
        let mut r = FieldReader::new(value)?;
        let payload = Self {
            valor_descuento: r.decimal("valor_descuento"),
            id_instalacion: r.pk("id_instalacion"),
        };
        r.finish(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn product_payload_collects_every_error() {
        let errors = ProductPayload::parse(&json!({
            "categoria": "",
            "producto_serie": "X".repeat(101),
            "cantidad": "muchos",
            "id_tecnico": 1,
            "fecha_asignacion": "ayer"
        }))
        .unwrap_err();

        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(
            fields,
            vec![
                "cantidad",
                "categoria",
                "fecha_asignacion",
                "nombre_producto",
                "producto_serie"
            ]
        );
    }

    #[test]
    fn rate_payload_parses_decimal_strings() {
        let rate = RatePayload::parse(&json!({
            "nombre_dr": "DR Rural",
            "valor_dr": "25000.50",
            "valor_dr_empresa": 30000
        }))
        .unwrap();
        assert_eq!(rate.valor_dr, dec!(25000.50));
        assert_eq!(rate.valor_dr_empresa, dec!(30000));
    }

    #[test]
    fn technician_code_is_limited_to_fifty_characters() {
        let errors = TechnicianPayload::parse(&json!({
            "nombre": "Ana",
            "apellido": "Gómez",
            "id_tecnico": "T".repeat(51)
        }))
        .unwrap_err();
        assert_eq!(
            errors["id_tecnico"],
            vec!["Ensure this field has no more than 50 characters."]
        );
    }
}
