use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::Value;

use super::catalog;
use super::common::{created_response, ListQuery, PaginatedResponse};
use crate::entities::installation;
use crate::errors::{ErrorResponse, ImportError, ServiceError};
use crate::services::bulk_import::{BulkImportReport, BulkImportRequest};
use crate::services::catalog::resources::Installations;
use crate::AppState;

/// List installations
#[utoipa::path(
    get,
    path = "/technet/instalaciones/",
    params(ListQuery),
    responses(
        (status = 200, description = "Installations listed", body = PaginatedResponse<installation::Model>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Invalid page.", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "instalaciones"
)]
pub async fn list_installations(
    state: State<AppState>,
    query: Query<ListQuery>,
) -> Result<Json<PaginatedResponse<installation::Model>>, ServiceError> {
    catalog::list::<Installations>(state, query).await
}

/// Fetch one installation with its derived totals
#[utoipa::path(
    get,
    path = "/technet/instalaciones/{id}/",
    params(("id" = i32, Path, description = "Installation id")),
    responses(
        (status = 200, description = "Installation fetched", body = installation::Model),
        (status = 404, description = "Installation not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "instalaciones"
)]
pub async fn get_installation(
    state: State<AppState>,
    id: Path<i32>,
) -> Result<Json<installation::Model>, ServiceError> {
    catalog::retrieve::<Installations>(state, id).await
}

/// Create an installation
///
/// `total`, `instalacion_compartida` and `valor_total_empresa` are computed
/// by the database; values sent for them are ignored.
#[utoipa::path(
    post,
    path = "/technet/instalaciones/",
    request_body = crate::dto::installation::InstallationPayload,
    responses(
        (status = 201, description = "Installation created", body = installation::Model),
        (status = 400, description = "Invalid fields", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "instalaciones"
)]
pub async fn create_installation(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ServiceError> {
    let created = state.services.installations.create(&body).await?;
    Ok(created_response(created))
}

/// Replace an installation
#[utoipa::path(
    put,
    path = "/technet/instalaciones/{id}/",
    params(("id" = i32, Path, description = "Installation id")),
    request_body = crate::dto::installation::InstallationPayload,
    responses(
        (status = 200, description = "Installation updated", body = installation::Model),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Installation not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "instalaciones"
)]
pub async fn update_installation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<Json<installation::Model>, ServiceError> {
    Ok(Json(state.services.installations.update(id, &body).await?))
}

/// Update some fields of an installation
#[utoipa::path(
    patch,
    path = "/technet/instalaciones/{id}/",
    params(("id" = i32, Path, description = "Installation id")),
    request_body = crate::dto::installation::InstallationPayload,
    responses(
        (status = 200, description = "Installation updated", body = installation::Model),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Installation not found", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "instalaciones"
)]
pub async fn partial_update_installation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<Value>,
) -> Result<Json<installation::Model>, ServiceError> {
    Ok(Json(
        state.services.installations.partial_update(id, &patch).await?,
    ))
}

/// Delete an installation
#[utoipa::path(
    delete,
    path = "/technet/instalaciones/{id}/",
    params(("id" = i32, Path, description = "Installation id")),
    responses(
        (status = 204, description = "Installation deleted"),
        (status = 404, description = "Installation not found", body = ErrorResponse),
        (status = 409, description = "Installation still referenced by a discount", body = ErrorResponse)
    ),
    security(("token" = [])),
    tag = "instalaciones"
)]
pub async fn delete_installation(
    state: State<AppState>,
    id: Path<i32>,
) -> Result<Response, ServiceError> {
    catalog::destroy::<Installations>(state, id).await
}

/// Import spreadsheet rows
///
/// Rows are processed independently. Missing serials and order numbers
/// become `"NA"`, unknown serials get a placeholder product and repeated
/// order numbers receive a `_DUPn` suffix.
#[utoipa::path(
    post,
    path = "/technet/instalaciones/bulk-import/",
    request_body = BulkImportRequest,
    responses(
        (status = 201, description = "At least one row imported", body = BulkImportReport),
        (status = 400, description = "No rows imported, or no rows submitted", body = BulkImportReport),
        (status = 500, description = "Import aborted")
    ),
    security(("token" = [])),
    tag = "instalaciones"
)]
pub async fn bulk_import(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<BulkImportReport>), ImportError> {
    let report = state.services.bulk_import.import(&body).await?;
    let status = if report.creadas > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(report)))
}

pub fn installation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/technet/instalaciones/",
            get(list_installations).post(create_installation),
        )
        .route(
            "/technet/instalaciones/bulk-import/",
            post(bulk_import),
        )
        .route(
            "/technet/instalaciones/:id/",
            get(get_installation)
                .put(update_installation)
                .patch(partial_update_installation)
                .delete(delete_installation),
        )
}
