//! Integration tests for the installation endpoints.

mod common;

use axum::http::Method;
use common::{installation_row, response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("expected a decimal, got {}", other),
    }
}

#[tokio::test]
async fn create_computes_totals_and_ignores_client_values() {
    let app = TestApp::new().await;
    app.seed_catalogs().await;

    let mut row = installation_row("OT-100");
    row["valor_añadido"] = json!("1000");
    row["total"] = json!("1");
    row["instalacion_compartida"] = json!("2");
    row["valor_total_empresa"] = json!("3");

    let created = app.create("/technet/instalaciones/", row).await;

    assert_eq!(created["numero_ot"], "OT-100");
    assert_eq!(decimal(&created["valor_añadido"]), dec!(1000));
    assert_eq!(decimal(&created["total"]), dec!(46000.50));
    assert_eq!(decimal(&created["instalacion_compartida"]), dec!(23000.25));
    assert_eq!(decimal(&created["valor_total_empresa"]), dec!(49000));
}

#[tokio::test]
async fn duplicate_order_number_is_a_field_error() {
    let app = TestApp::new().await;
    app.seed_catalogs().await;
    app.create("/technet/instalaciones/", installation_row("OT-1"))
        .await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/technet/instalaciones/",
            Some(installation_row("OT-1")),
        )
        .await;

    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(
        body["fields"]["numero_ot"],
        json!(["instalaciones with this numero ot already exists."])
    );
}

#[tokio::test]
async fn retrieve_update_patch_and_delete() {
    let app = TestApp::new().await;
    app.seed_catalogs().await;
    let created = app
        .create("/technet/instalaciones/", installation_row("OT-200"))
        .await;
    let id = created["id_instalacion"].as_i64().unwrap();
    let uri = format!("/technet/instalaciones/{}/", id);

    let response = app.request_authenticated(Method::GET, &uri, None).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["numero_ot"], "OT-200");

    let mut replacement = installation_row("OT-200");
    replacement["direccion"] = json!("Calle 80 # 10-20");
    replacement["valor_orden"] = json!("10000");
    let response = app
        .request_authenticated(Method::PUT, &uri, Some(replacement))
        .await;
    assert_eq!(response.status(), 200);
    let updated = response_json(response).await;
    assert_eq!(updated["direccion"], "Calle 80 # 10-20");
    assert_eq!(decimal(&updated["total"]), dec!(35000));

    let response = app
        .request_authenticated(
            Method::PATCH,
            &uri,
            Some(json!({"observaciones": "Cliente ausente", "total": "5"})),
        )
        .await;
    assert_eq!(response.status(), 200);
    let patched = response_json(response).await;
    assert_eq!(patched["observaciones"], "Cliente ausente");
    assert_eq!(patched["direccion"], "Calle 80 # 10-20");
    assert_eq!(decimal(&patched["total"]), dec!(35000));

    let response = app.request_authenticated(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), 204);

    let response = app.request_authenticated(Method::GET, &uri, None).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn missing_references_are_reported_per_field() {
    let app = TestApp::new().await;
    app.seed_catalogs().await;

    let mut row = installation_row("OT-300");
    row["id_tecnico"] = json!(42);
    row["producto_serie"] = json!("SN-404");

    let response = app
        .request_authenticated(Method::POST, "/technet/instalaciones/", Some(row))
        .await;

    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(
        body["fields"],
        json!({
            "id_tecnico": ["Invalid pk \"42\" - object does not exist."],
            "producto_serie": ["Object with producto_serie=SN-404 does not exist."]
        })
    );
}

#[tokio::test]
async fn list_filters_search_and_orders_newest_first() {
    let app = TestApp::new().await;
    app.seed_catalogs().await;
    app.create("/technet/operadores/", json!({"nombre_operador": "Movistar"}))
        .await;

    let mut older = installation_row("OT-A");
    older["fecha_instalacion"] = json!("2024-01-15");
    older["direccion"] = json!("Avenida Boyacá 12");
    let mut newer = installation_row("OT-B");
    newer["fecha_instalacion"] = json!("2024-03-01");
    newer["id_operador"] = json!(2);
    for row in [older, newer] {
        app.create("/technet/instalaciones/", row).await;
    }

    let listed = response_json(
        app.request_authenticated(Method::GET, "/technet/instalaciones/", None)
            .await,
    )
    .await;
    assert_eq!(listed["count"], 2);
    assert_eq!(listed["results"][0]["numero_ot"], "OT-B");
    assert_eq!(listed["results"][1]["numero_ot"], "OT-A");

    let by_operator = response_json(
        app.request_authenticated(Method::GET, "/technet/instalaciones/?id_operador=2", None)
            .await,
    )
    .await;
    assert_eq!(by_operator["count"], 1);
    assert_eq!(by_operator["results"][0]["numero_ot"], "OT-B");

    let by_date = response_json(
        app.request_authenticated(
            Method::GET,
            "/technet/instalaciones/?fecha_inicio=2024-01-01&fecha_fin=2024-01-31",
            None,
        )
        .await,
    )
    .await;
    assert_eq!(by_date["count"], 1);
    assert_eq!(by_date["results"][0]["numero_ot"], "OT-A");

    let searched = response_json(
        app.request_authenticated(Method::GET, "/technet/instalaciones/?search=boyac", None)
            .await,
    )
    .await;
    assert_eq!(searched["count"], 1);
    assert_eq!(searched["results"][0]["numero_ot"], "OT-A");
}

#[tokio::test]
async fn malformed_filters_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::GET, "/technet/instalaciones/?id_tecnico=uno", None)
        .await;

    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["fields"]["id_tecnico"], json!(["Enter a number."]));
}
