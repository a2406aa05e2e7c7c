pub mod catalog;
pub mod common;
pub mod installations;

use std::sync::Arc;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::services::bulk_import::BulkImportService;
use crate::services::installations::InstallationService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub installations: Arc<InstallationService>,
    pub bulk_import: Arc<BulkImportService>,
    pub auth: Arc<AuthService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, secret_key: &str) -> Self {
        Self {
            installations: Arc::new(InstallationService::new(db_pool.clone())),
            bulk_import: Arc::new(BulkImportService::new(db_pool.clone())),
            auth: Arc::new(AuthService::new(db_pool, secret_key)),
        }
    }
}
