#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use technet_api::{config::AppConfig, db, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
pub const TEST_USERNAME: &str = "admin";
pub const TEST_PASSWORD: &str = "admin-password";

/// Application backed by a throwaway SQLite file with migrations applied and
/// one logged-in user.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_path = dir.path().join("technet_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_000,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        state
            .services
            .auth
            .create_user(TEST_USERNAME, TEST_PASSWORD)
            .await
            .expect("failed to create test user");
        let (_, token) = state
            .services
            .auth
            .login(TEST_USERNAME, TEST_PASSWORD)
            .await
            .expect("failed to log in test user");

        Self {
            router: technet_api::build_router(state.clone()),
            state,
            token: token.key,
            _dir: dir,
        }
    }

    /// Token of the seeded user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Token {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// POSTs `body` and returns the created row, failing unless the API answers 201.
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let response = self
            .request_authenticated(Method::POST, uri, Some(body))
            .await;
        let status = response.status();
        let json = response_json(response).await;
        assert_eq!(status, 201, "creating via {} failed: {}", uri, json);
        json
    }

    /// One row in every catalog an installation references, plus product `SN-1`.
    pub async fn seed_catalogs(&self) {
        self.create(
            "/technet/tecnicos/",
            json!({"nombre": "Ana", "apellido": "Pérez", "id_tecnico": "T-001"}),
        )
        .await;
        self.create("/technet/operadores/", json!({"nombre_operador": "Claro"}))
            .await;
        self.create(
            "/technet/dr/",
            json!({"nombre_dr": "DR Urbano", "valor_dr": "25000", "valor_dr_empresa": "27000"}),
        )
        .await;
        self.create(
            "/technet/tipodeordenes/",
            json!({"nombre_orden": "Alta", "valor_orden": "20000.50", "valor_orden_empresa": "22000"}),
        )
        .await;
        self.create(
            "/technet/acometidas/",
            json!({"nombre_acometida": "Aérea", "precio": "15000"}),
        )
        .await;
        self.create(
            "/technet/productos/",
            json!({
                "categoria": "ONT",
                "nombre_producto": "ONT Huawei",
                "producto_serie": "SN-1",
                "cantidad": 1,
                "id_tecnico": 1,
                "fecha_asignacion": "2024-04-30"
            }),
        )
        .await;
    }
}

/// Installation row referencing the catalogs created by [`TestApp::seed_catalogs`].
pub fn installation_row(numero_ot: &str) -> Value {
    json!({
        "fecha_instalacion": "2024-05-02",
        "id_tecnico": 1,
        "id_operador": 1,
        "direccion": "Cra 7 # 45-12",
        "numero_ot": numero_ot,
        "producto_serie": "SN-1",
        "id_dr": 1,
        "eq_reutilizado": null,
        "eq_retirado": null,
        "id_tipo_orden": 1,
        "metros_cable": "35.5",
        "id_acometida": 1,
        "observaciones": "Sin novedad",
        "valor_añadido": null,
        "valor_opcional_empresa": null,
        "valor_dr": "25000",
        "valor_orden": "20000.50",
        "valor_orden_empresa": "22000",
        "valor_dr_empresa": "27000",
        "serie_dr": null,
        "categoria": "ONT"
    })
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json response")
}
