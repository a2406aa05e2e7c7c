//! Generic REST handlers shared by the catalog tables.

use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
    routing::get,
    Router,
};
use sea_orm::IntoActiveModel;
use serde_json::Value;

use super::common::{created_response, no_content_response, ListQuery, PaginatedResponse};
use crate::errors::ServiceError;
use crate::services::catalog::{Resource, WritableResource};
use crate::AppState;

pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<R::Model>>, ServiceError> {
    let filters = query.filters()?;
    let page = query.page_number()?;
    let page_size = query.page_size(
        state.config.api_default_page_size,
        state.config.api_max_page_size,
    );

    let page = state.catalog::<R>().list(&filters, page, page_size).await?;
    Ok(Json(page.into()))
}

pub async fn retrieve<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<R::Model>, ServiceError> {
    Ok(Json(state.catalog::<R>().get(id).await?))
}

pub async fn destroy<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.catalog::<R>().delete(id).await?;
    Ok(no_content_response())
}

pub async fn create<R>(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response, ServiceError>
where
    R: WritableResource,
    R::Model: IntoActiveModel<R::ActiveModel>,
{
    let model = state.catalog::<R>().create(&body).await?;
    Ok(created_response(model))
}

pub async fn update<R>(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<Json<R::Model>, ServiceError>
where
    R: WritableResource,
    R::Model: IntoActiveModel<R::ActiveModel>,
{
    Ok(Json(state.catalog::<R>().update(id, &body).await?))
}

pub async fn partial_update<R>(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(patch): Json<Value>,
) -> Result<Json<R::Model>, ServiceError>
where
    R: WritableResource,
    R::Model: IntoActiveModel<R::ActiveModel>,
{
    Ok(Json(state.catalog::<R>().partial_update(id, &patch).await?))
}

/// `/technet/{base}/` and `/technet/{base}/:id/` with the full set of verbs.
pub fn catalog_routes<R>(base: &str) -> Router<AppState>
where
    R: WritableResource,
    R::Model: IntoActiveModel<R::ActiveModel>,
{
    Router::new()
        .route(
            &format!("/technet/{}/", base),
            get(list::<R>).post(create::<R>),
        )
        .route(
            &format!("/technet/{}/:id/", base),
            get(retrieve::<R>)
                .put(update::<R>)
                .patch(partial_update::<R>)
                .delete(destroy::<R>),
        )
}
