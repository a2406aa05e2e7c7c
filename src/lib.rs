//! Technet API Library
//!
//! Installation ledger, catalogs and bulk import for technician field work
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::AuthRouterExt;
use crate::handlers::catalog::catalog_routes;
use crate::services::catalog::{resources, CatalogService, Resource};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config.secret_key);
        Self {
            db,
            config,
            services,
        }
    }

    pub fn catalog<R: Resource>(&self) -> CatalogService<R> {
        CatalogService::new(self.db.clone())
    }
}

/// Routes under `/technet`, all behind token authentication
pub fn technet_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes::<resources::ConnectionTypes>("acometidas"))
        .merge(catalog_routes::<resources::Discounts>("descuentos"))
        .merge(catalog_routes::<resources::Rates>("dr"))
        .merge(catalog_routes::<resources::Operators>("operadores"))
        .merge(catalog_routes::<resources::Products>("productos"))
        .merge(catalog_routes::<resources::Technicians>("tecnicos"))
        .merge(catalog_routes::<resources::OrderTypes>("tipodeordenes"))
        .merge(handlers::installations::installation_routes())
        .with_auth()
}

/// Full application router with state applied.
///
/// Transport concerns (CORS, compression, timeouts) are left to the binary.
pub fn build_router(state: AppState) -> Router {
    let auth_service = state.services.auth.clone();
    let max_body_size = state.config.max_body_size;

    Router::<AppState>::new()
        .route("/", get(|| async { "technet-api up" }))
        .route("/health", get(health_check))
        .merge(technet_routes())
        .nest("/token", auth::auth_routes().with_state(auth_service.clone()))
        .merge(openapi::swagger_ui())
        .layer(DefaultBodyLimit::max(max_body_size))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Inject AuthService into request extensions for auth middleware
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            |State(auth): State<Arc<auth::AuthService>>,
             mut req: axum::http::Request<axum::body::Body>,
             next: axum::middleware::Next| async move {
                req.extensions_mut().insert(auth);
                next.run(req).await
            },
        ))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db_status = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };
    let status = if db_status == "healthy" {
        StatusCode::OK
    } else {
        ::tracing::warn!("Health check failed: database unreachable");
        StatusCode::SERVICE_UNAVAILABLE
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status, Json(health_data))
}
