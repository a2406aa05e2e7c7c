use crate::config::AppConfig;
use crate::errors::ServiceError;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns a `ServiceError` if the connection cannot be established
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Configuring database connection"
    );

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(true);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!(
        backend = ?db_pool.get_database_backend(),
        "Database connection pool established successfully"
    );

    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Runs database migrations
///
/// # Errors
/// Returns a `ServiceError` if migrations fail to execute
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(|e| ServiceError::MigrationError(e.to_string()));

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!(
            "Database migrations completed successfully in {:?}",
            elapsed
        ),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Rolls back every applied migration
pub async fn rollback_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Rolling back database migrations");
    crate::migrator::Migrator::down(pool, None)
        .await
        .map_err(|e| ServiceError::MigrationError(e.to_string()))
}

/// Names of migrations not yet applied
pub async fn pending_migrations(pool: &DbPool) -> Result<Vec<String>, ServiceError> {
    let pending = crate::migrator::Migrator::get_pending_migrations(pool)
        .await
        .map_err(|e| ServiceError::MigrationError(e.to_string()))?;
    Ok(pending.iter().map(|m| m.name().to_string()).collect())
}

/// Executes a multi-statement SQL script as-is.
pub async fn execute_script(pool: &DbPool, sql: &str) -> Result<u64, ServiceError> {
    let start = Instant::now();
    let result = pool.execute_unprepared(sql).await.map_err(|e| {
        error!("SQL script failed after {:?}: {}", start.elapsed(), e);
        ServiceError::DatabaseError(e)
    })?;
    info!(
        rows_affected = result.rows_affected(),
        "SQL script executed in {:?}",
        start.elapsed()
    );
    Ok(result.rows_affected())
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    debug!("Checking database connection");
    let start = Instant::now();

    let result = pool.ping().await.map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => debug!("Database connection check successful in {:?}", elapsed),
        Err(e) => error!(
            "Database connection check failed after {:?}: {}",
            elapsed, e
        ),
    }

    result
}

/// Closes the database connection pool
pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Closing database connection pool");
    pool.close().await.map_err(ServiceError::DatabaseError)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_config(dir: &tempfile::TempDir) -> DbConfig {
        DbConfig {
            url: format!("sqlite://{}?mode=rwc", dir.path().join("db.sqlite").display()),
            max_connections: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn migrations_apply_and_leave_nothing_pending() {
        let dir = tempfile::tempdir().unwrap();
        let pool = establish_connection_with_config(&sqlite_config(&dir))
            .await
            .unwrap();
        assert!(check_connection(&pool).await.is_ok());

        assert!(!pending_migrations(&pool).await.unwrap().is_empty());
        run_migrations(&pool).await.unwrap();
        assert!(pending_migrations(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn execute_script_runs_multiple_statements() {
        let dir = tempfile::tempdir().unwrap();
        let pool = establish_connection_with_config(&sqlite_config(&dir))
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        execute_script(
            &pool,
            "INSERT INTO operadores (nombre_operador) VALUES ('Movistar');\n\
             INSERT INTO operadores (nombre_operador) VALUES ('Claro');",
        )
        .await
        .unwrap();

        let row = pool
            .query_one(sea_orm::Statement::from_string(
                pool.get_database_backend(),
                "SELECT COUNT(*) AS total FROM operadores".to_string(),
            ))
            .await
            .unwrap()
            .unwrap();
        let total: i64 = row.try_get("", "total").unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn deleting_a_referenced_row_is_a_conflict() {
        use sea_orm::EntityTrait;

        let dir = tempfile::tempdir().unwrap();
        let pool = establish_connection_with_config(&sqlite_config(&dir))
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        execute_script(
            &pool,
            "INSERT INTO tecnicos (nombre, apellido, id_tecnico) VALUES ('Ana', 'Pérez', 'T-1');\n\
             INSERT INTO productos (categoria, nombre_producto, producto_serie, cantidad, id_tecnico, fecha_asignacion) \
             VALUES ('ONT', 'ONT', 'SN-1', 1, 1, '2024-01-01');",
        )
        .await
        .unwrap();

        let err = crate::entities::technician::Entity::delete_by_id(1)
            .exec(&pool)
            .await
            .unwrap_err();
        assert!(matches!(
            ServiceError::from_db(err),
            ServiceError::Conflict(_)
        ));
    }
}
