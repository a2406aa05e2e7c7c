/*!
 * # Authentication
 *
 * Username/password login issuing one opaque token per user. Every protected
 * route expects `Authorization: Token <key>` (`Bearer <key>` is accepted too).
 *
 * - Passwords are stored as argon2id PHC strings, peppered with the
 *   configured secret key.
 * - Tokens live in the `auth_tokens` table until the user logs out.
 */

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::entities::{auth_token, user};

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::{extract_token, generate_key, generate_secret_key};

/// Message returned for every failed login, whatever the cause
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Usuario o contraseña incorrectos";

/// Authenticated caller, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub token: String,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        AuthError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, detail): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication credentials were not provided.".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                "AUTH_INVALID_CREDENTIALS",
                INVALID_CREDENTIALS_MESSAGE.to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid token.".to_string(),
            ),
            Self::DuplicateUsername(name) => (
                StatusCode::CONFLICT,
                "AUTH_DUPLICATE_USERNAME",
                format!("A user with username {} already exists.", name),
            ),
            Self::DatabaseError(msg) | Self::InternalError(msg) => {
                error!(error = %msg, "Authentication failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AUTH_INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        // Login failures carry only the detail message
        let body = if matches!(self, Self::InvalidCredentials) {
            serde_json::json!({ "detail": detail })
        } else {
            serde_json::json!({ "detail": detail, "code": error_code })
        };

        (status, Json(body)).into_response()
    }
}

/// User accounts and their tokens
#[derive(Clone)]
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    secret_key: String,
}

impl AuthService {
    pub fn new(db: Arc<DatabaseConnection>, secret_key: impl Into<String>) -> Self {
        Self {
            db,
            secret_key: secret_key.into(),
        }
    }

    fn pepper(&self) -> &[u8] {
        self.secret_key.as_bytes()
    }

    /// Creates an active account. Usernames are unique.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<user::Model, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InternalError(
                "username and password must not be empty".to_string(),
            ));
        }

        let existing = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(AuthError::DuplicateUsername(username.to_string()));
        }

        let account = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(hash_password(password, self.pepper())?),
            is_active: Set(true),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        info!(user_id = account.id, username = %account.username, "User created");
        Ok(account)
    }

    /// Checks the credentials and returns the user's token, creating it on
    /// first login.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(user::Model, auth_token::Model), AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let account = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?
            .filter(|account| account.is_active)
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash, self.pepper()) {
            warn!(username = %username, "Rejected login");
            return Err(AuthError::InvalidCredentials);
        }

        let existing = auth_token::Entity::find()
            .filter(auth_token::Column::UserId.eq(account.id))
            .one(self.db.as_ref())
            .await?;
        let token = match existing {
            Some(token) => token,
            None => {
                auth_token::ActiveModel {
                    key: Set(generate_key()),
                    user_id: Set(account.id),
                    created: Set(Utc::now()),
                }
                .insert(self.db.as_ref())
                .await?
            }
        };

        debug!(user_id = account.id, "Login succeeded");
        Ok((account, token))
    }

    /// Resolves a token key to its active owner.
    pub async fn authenticate_token(&self, key: &str) -> Result<AuthUser, AuthError> {
        let (token, account) = auth_token::Entity::find_by_id(key.to_string())
            .find_also_related(user::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        match account {
            Some(account) if account.is_active => Ok(AuthUser {
                user_id: account.id,
                username: account.username,
                token: token.key,
            }),
            _ => Err(AuthError::InvalidToken),
        }
    }

    pub async fn revoke_token(&self, key: &str) -> Result<(), AuthError> {
        auth_token::Entity::delete_by_id(key.to_string())
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}

/// Authentication middleware that resolves the token and stores an
/// [`AuthUser`] in the request extensions
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    let key = match extract_token(request.headers()) {
        Some(key) => key.to_string(),
        None => return AuthError::MissingAuth.into_response(),
    };

    match auth_service.authenticate_token(&key).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }
}

/// Missing fields read as empty and fail like a wrong password
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin")]
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b")]
    pub auth_token: String,
    pub user_id: i32,
    pub username: String,
}

/// Authentication routes, mounted under `/token`
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    let logout = axum::Router::new()
        .route("/logout/", axum::routing::post(logout_handler))
        .with_auth();

    axum::Router::new()
        .route("/login/", axum::routing::post(login_handler))
        .merge(logout)
        .layer(DefaultBodyLimit::max(1024 * 64))
}

/// Exchange username and password for the user's token
#[utoipa::path(
    post,
    path = "/token/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 400, description = "Usuario o contraseña incorrectos")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let credentials = payload
        .map_err(|rejection| {
            debug!(error = %rejection, "Unreadable login body");
            AuthError::InvalidCredentials
        })?
        .0;
    let (account, token) = auth_service
        .login(&credentials.username, &credentials.password)
        .await?;

    Ok(Json(LoginResponse {
        auth_token: token.key,
        user_id: account.id,
        username: account.username,
    }))
}

/// Delete the caller's token
#[utoipa::path(
    post,
    path = "/token/logout/",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Missing or unknown token")
    ),
    security(("token" = [])),
    tag = "auth"
)]
pub async fn logout_handler(
    State(auth_service): State<Arc<AuthService>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<StatusCode, AuthError> {
    auth_service.revoke_token(&auth_user.token).await?;
    info!(user_id = auth_user.user_id, "Token revoked");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn bad_credentials_are_a_plain_400() {
        let response = AuthError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"detail": INVALID_CREDENTIALS_MESSAGE})
        );
    }

    #[tokio::test]
    async fn token_errors_are_unauthorized() {
        for err in [AuthError::MissingAuth, AuthError::InvalidToken] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert!(body["code"].as_str().unwrap().starts_with("AUTH_"));
        }
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let response = AuthError::DatabaseError("password=hunter2".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body.to_string().contains("hunter2"));
    }
}
