//! Integration tests for the generic catalog endpoints.

mod common;

use axum::http::Method;
use common::{installation_row, response_json, TestApp};
use serde_json::json;

async fn seed_technicians(app: &TestApp, count: usize) {
    for n in 1..=count {
        app.create(
            "/technet/tecnicos/",
            json!({"nombre": format!("Técnico {}", n), "apellido": "Gómez", "id_tecnico": format!("T-{:03}", n)}),
        )
        .await;
    }
}

#[tokio::test]
async fn technician_crud_round_trip() {
    let app = TestApp::new().await;

    let created = app
        .create(
            "/technet/tecnicos/",
            json!({"nombre": "Luis", "apellido": "Rojas", "id_tecnico": "T-900"}),
        )
        .await;
    let id = created["id_unico_tecnico"].as_i64().unwrap();
    let uri = format!("/technet/tecnicos/{}/", id);

    let response = app
        .request_authenticated(
            Method::PUT,
            &uri,
            Some(json!({"nombre": "Luis Carlos", "apellido": "Rojas", "id_tecnico": "T-900"})),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["nombre"], "Luis Carlos");

    let response = app
        .request_authenticated(Method::PATCH, &uri, Some(json!({"apellido": "Rojas Díaz"})))
        .await;
    assert_eq!(response.status(), 200);
    let patched = response_json(response).await;
    assert_eq!(patched["nombre"], "Luis Carlos");
    assert_eq!(patched["apellido"], "Rojas Díaz");

    let response = app.request_authenticated(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), 204);

    let response = app.request_authenticated(Method::GET, &uri, None).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn create_reports_missing_fields() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::POST, "/technet/operadores/", Some(json!({})))
        .await;

    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(
        body["fields"],
        json!({"nombre_operador": ["This field is required."]})
    );
}

#[tokio::test]
async fn search_is_case_insensitive() {
    let app = TestApp::new().await;
    app.create(
        "/technet/tecnicos/",
        json!({"nombre": "Marta", "apellido": "Suárez", "id_tecnico": "T-010"}),
    )
    .await;
    app.create(
        "/technet/tecnicos/",
        json!({"nombre": "Pedro", "apellido": "Linares", "id_tecnico": "T-011"}),
    )
    .await;

    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?search=MARTA", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["nombre"], "Marta");

    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?search=t-01", None)
        .await;
    assert_eq!(response_json(response).await["count"], 2);
}

#[tokio::test]
async fn search_folds_accented_letters_and_matches_wildcards_literally() {
    let app = TestApp::new().await;
    app.create(
        "/technet/tecnicos/",
        json!({"nombre": "Ana", "apellido": "PÉREZ", "id_tecnico": "T-020"}),
    )
    .await;
    app.create(
        "/technet/tecnicos/",
        json!({"nombre": "Luz", "apellido": "Ortiz", "id_tecnico": "T_021"}),
    )
    .await;

    // ?search=pérez
    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?search=p%C3%A9rez", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["nombre"], "Ana");

    // ?search=%
    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?search=%25", None)
        .await;
    assert_eq!(response_json(response).await["count"], 0);

    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?search=_", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id_tecnico"], "T_021");

    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?search=*", None)
        .await;
    assert_eq!(response_json(response).await["count"], 0);
}

#[tokio::test]
async fn pages_link_by_number() {
    let app = TestApp::new().await;
    seed_technicians(&app, 3).await;

    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?page_size=2", None)
        .await;
    let first = response_json(response).await;
    assert_eq!(first["count"], 3);
    assert_eq!(first["next"], 2);
    assert_eq!(first["previous"], json!(null));
    assert_eq!(first["results"].as_array().unwrap().len(), 2);

    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?page_size=2&page=2", None)
        .await;
    let second = response_json(response).await;
    assert_eq!(second["next"], json!(null));
    assert_eq!(second["previous"], 1);
    assert_eq!(second["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn oversized_page_size_is_clamped() {
    let app = TestApp::new().await;
    seed_technicians(&app, 3).await;

    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?page_size=50001", None)
        .await;

    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    assert_eq!(body["next"], json!(null));
}

#[tokio::test]
async fn page_past_the_end_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/", None)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["count"], 0);

    let response = app
        .request_authenticated(Method::GET, "/technet/tecnicos/?page=2", None)
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(response_json(response).await["message"], "Invalid page.");
}

#[tokio::test]
async fn products_filter_by_technician() {
    let app = TestApp::new().await;
    seed_technicians(&app, 2).await;
    for (serial, owner, fecha) in [("SN-A", 1, "2024-01-10"), ("SN-B", 2, "2024-02-10"), ("SN-C", 1, "2024-03-10")] {
        app.create(
            "/technet/productos/",
            json!({
                "categoria": "ONT",
                "nombre_producto": "ONT",
                "producto_serie": serial,
                "cantidad": 1,
                "id_tecnico": owner,
                "fecha_asignacion": fecha
            }),
        )
        .await;
    }

    let response = app
        .request_authenticated(Method::GET, "/technet/productos/?id_tecnico=1", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["producto_serie"], "SN-C");
    assert_eq!(body["results"][1]["producto_serie"], "SN-A");
}

#[tokio::test]
async fn product_with_unknown_technician_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/technet/productos/",
            Some(json!({
                "categoria": "ONT",
                "nombre_producto": "ONT",
                "producto_serie": "SN-X",
                "cantidad": 1,
                "id_tecnico": 5,
                "fecha_asignacion": "2024-01-10"
            })),
        )
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(
        response_json(response).await["fields"]["id_tecnico"],
        json!(["Invalid pk \"5\" - object does not exist."])
    );
}

#[tokio::test]
async fn deleting_a_referenced_row_conflicts() {
    let app = TestApp::new().await;
    app.seed_catalogs().await;
    let installation = app
        .create("/technet/instalaciones/", installation_row("OT-D1"))
        .await;
    app.create(
        "/technet/descuentos/",
        json!({"valor_descuento": "5000", "id_instalacion": installation["id_instalacion"]}),
    )
    .await;

    let response = app
        .request_authenticated(Method::DELETE, "/technet/operadores/1/", None)
        .await;
    assert_eq!(response.status(), 409);

    let response = app
        .request_authenticated(Method::GET, "/technet/operadores/1/", None)
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn duplicate_unique_values_conflict() {
    let app = TestApp::new().await;
    seed_technicians(&app, 1).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/technet/tecnicos/",
            Some(json!({"nombre": "Otro", "apellido": "Gómez", "id_tecnico": "T-001"})),
        )
        .await;

    assert_eq!(response.status(), 409);
}
