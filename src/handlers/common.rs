use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::dto::{parse_date, push_error, FieldErrors};
use crate::errors::ServiceError;
use crate::services::catalog::{ListFilters, Page};

const INVALID_NUMBER_FILTER: &str = "Enter a number.";
const INVALID_DATE_FILTER: &str = "Enter a valid date.";

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Query string accepted by every list endpoint.
///
/// Everything arrives as text so that malformed values produce the same
/// error bodies as the rest of the API instead of an extractor rejection.
#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<String>,
    /// Rows per page; capped at the configured maximum
    pub page_size: Option<String>,
    /// Case-insensitive substring matched against the resource's search fields
    pub search: Option<String>,
    pub id_tecnico: Option<String>,
    pub id_operador: Option<String>,
    /// Inclusive lower bound on `fecha_instalacion` (YYYY-MM-DD)
    pub fecha_inicio: Option<String>,
    /// Inclusive upper bound on `fecha_instalacion` (YYYY-MM-DD)
    pub fecha_fin: Option<String>,
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ListQuery {
    /// Requested page; anything that is not a positive integer is an invalid page.
    pub fn page_number(&self) -> Result<u64, ServiceError> {
        match present(&self.page) {
            None => Ok(1),
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|page| *page > 0)
                .ok_or(ServiceError::InvalidPage),
        }
    }

    pub fn page_size(&self, default: u64, max: u64) -> u64 {
        resolve_page_size(present(&self.page_size), default, max)
    }

    /// Filters for the service layer. Empty parameters are ignored.
    pub fn filters(&self) -> Result<ListFilters, ServiceError> {
        let mut errors = FieldErrors::new();

        let mut number = |field: &str, raw: &Option<String>| {
            present(raw).and_then(|value| match value.parse::<i32>() {
                Ok(n) => Some(n),
                Err(_) => {
                    push_error(&mut errors, field, INVALID_NUMBER_FILTER);
                    None
                }
            })
        };
        let id_tecnico = number("id_tecnico", &self.id_tecnico);
        let id_operador = number("id_operador", &self.id_operador);

        let mut date = |field: &str, raw: &Option<String>| {
            present(raw).and_then(|value| match parse_date(value) {
                Some(d) => Some(d),
                None => {
                    push_error(&mut errors, field, INVALID_DATE_FILTER);
                    None
                }
            })
        };
        let fecha_inicio = date("fecha_inicio", &self.fecha_inicio);
        let fecha_fin = date("fecha_fin", &self.fecha_fin);

        if !errors.is_empty() {
            return Err(ServiceError::FieldValidation(errors));
        }

        Ok(ListFilters {
            search: present(&self.search).map(str::to_string),
            id_tecnico,
            id_operador,
            fecha_inicio,
            fecha_fin,
        })
    }
}

/// Positive sizes are capped at `max`; zero, negative or unparsable values
/// fall back to `default`.
pub fn resolve_page_size(raw: Option<&str>, default: u64, max: u64) -> u64 {
    match raw.and_then(|s| s.parse::<u64>().ok()) {
        Some(size) if size > 0 => size.min(max),
        _ => default,
    }
}

/// Paginated list body
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// Rows matching the query across all pages
    pub count: u64,
    /// Next page number, if any
    pub next: Option<u64>,
    /// Previous page number, if any
    pub previous: Option<u64>,
    pub results: Vec<T>,
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            count: page.count,
            next: page.next_page(),
            previous: page.previous_page(),
            results: page.items,
        }
    }
}
