use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Technet API",
        version = "1.0.0",
        description = r#"
# Technet Installations API

Back office for technician field installations: the installation ledger,
the catalogs it references and a spreadsheet bulk import.

## Authentication

Obtain a token from `POST /token/login/` and send it on every `/technet` request:

```
Authorization: Token <key>
```

## Pagination

List endpoints accept `page` (default 1), `page_size` (default 20, max 50000)
and `search`. Responses look like `{"count", "next", "previous", "results"}`
where `next` and `previous` are page numbers.
        "#
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Token login and logout"),
        (name = "instalaciones", description = "Installation ledger and bulk import")
    ),
    paths(
        crate::auth::login_handler,
        crate::auth::logout_handler,

        crate::handlers::installations::list_installations,
        crate::handlers::installations::get_installation,
        crate::handlers::installations::create_installation,
        crate::handlers::installations::update_installation,
        crate::handlers::installations::partial_update_installation,
        crate::handlers::installations::delete_installation,
        crate::handlers::installations::bulk_import,
    ),
    components(
        schemas(
            crate::auth::LoginRequest,
            crate::auth::LoginResponse,

            crate::entities::technician::Model,
            crate::entities::operator::Model,
            crate::entities::product::Model,
            crate::entities::rate::Model,
            crate::entities::connection_type::Model,
            crate::entities::order_type::Model,
            crate::entities::discount::Model,
            crate::entities::installation::Model,

            crate::dto::installation::InstallationPayload,
            crate::services::bulk_import::BulkImportRequest,
            crate::services::bulk_import::BulkImportReport,
            crate::services::bulk_import::RowError,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&TokenSecurity)
)]
pub struct ApiDocV1;

/// Registers the `Authorization: Token <key>` scheme referenced by the paths.
struct TokenSecurity;

impl Modify for TokenSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "Token <key> as returned by /token/login/",
                ))),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
