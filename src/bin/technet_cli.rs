use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use sea_orm::{EntityTrait, PaginatorTrait};
use technet_api::{
    auth::{generate_secret_key, AuthService},
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::user,
};
use tracing::debug;

const ENV_TEMPLATE: &str = ".env.example";
const ENV_FILE: &str = ".env";
const SECRET_KEY_VAR: &str = "APP__SECRET_KEY";
const SECRET_PLACEHOLDER: &str = "change-me";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate(args) => handle_migrate(args).await?,
        Commands::ImportSql(args) => handle_import_sql(args).await?,
        Commands::CreateUser(args) => handle_create_user(args).await?,
        Commands::GenerateSecret => println!("{}", generate_secret_key()),
        Commands::SetupEnv(args) => handle_setup_env(args)?,
        Commands::CheckReady => handle_check_ready().await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "technet", about = "Operational commands for the Technet API", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply (or roll back) database migrations
    Migrate(MigrateArgs),
    /// Execute a plain SQL dump against the configured database
    ImportSql(ImportSqlArgs),
    /// Create a login account
    CreateUser(CreateUserArgs),
    /// Print a fresh value for APP__SECRET_KEY
    GenerateSecret,
    /// Create .env from .env.example with a generated secret
    SetupEnv(SetupEnvArgs),
    /// Run the deployment readiness checklist
    CheckReady,
}

#[derive(Args)]
struct MigrateArgs {
    #[arg(long, action = ArgAction::SetTrue, help = "Roll back every applied migration")]
    down: bool,
}

#[derive(Args)]
struct ImportSqlArgs {
    #[arg(help = "Path to the SQL file")]
    file: PathBuf,
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long, help = "Login name for the account")]
    username: String,
    #[arg(long, help = "Password for the account")]
    password: String,
}

#[derive(Args)]
struct SetupEnvArgs {
    #[arg(long, action = ArgAction::SetTrue, help = "Overwrite an existing .env")]
    force: bool,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        Ok(Self {
            config,
            db: Arc::new(db_pool),
        })
    }

    fn auth_service(&self) -> AuthService {
        AuthService::new(self.db.clone(), self.config.secret_key.clone())
    }
}

async fn handle_migrate(args: MigrateArgs) -> Result<()> {
    let context = CliContext::initialize().await?;

    if args.down {
        db::rollback_migrations(&context.db)
            .await
            .context("failed to roll back migrations")?;
        println!("Migrations rolled back");
    } else {
        db::run_migrations(&context.db)
            .await
            .context("failed to apply migrations")?;
        println!("Migrations applied");
    }

    Ok(())
}

async fn handle_import_sql(args: ImportSqlArgs) -> Result<()> {
    if !args.file.is_file() {
        bail!("SQL file not found: {}", args.file.display());
    }
    let sql = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let context = CliContext::initialize().await?;
    let start = Instant::now();
    let rows = db::execute_script(&context.db, &sql)
        .await
        .with_context(|| format!("failed to import {}", args.file.display()))?;

    println!(
        "Imported {} in {:.2?} ({} rows affected)",
        args.file.display(),
        start.elapsed(),
        rows
    );
    Ok(())
}

async fn handle_create_user(args: CreateUserArgs) -> Result<()> {
    let context = CliContext::initialize().await?;
    let account = context
        .auth_service()
        .create_user(&args.username, &args.password)
        .await
        .context("failed to create user")?;

    println!("User {} created (id {})", account.username, account.id);
    Ok(())
}

fn handle_setup_env(args: SetupEnvArgs) -> Result<()> {
    let target = Path::new(ENV_FILE);
    if target.exists() && !args.force {
        bail!("{} already exists; pass --force to overwrite it", ENV_FILE);
    }

    let template = fs::read_to_string(ENV_TEMPLATE)
        .with_context(|| format!("failed to read {}", ENV_TEMPLATE))?;
    let rendered = render_env(&template, &generate_secret_key());
    fs::write(target, rendered).with_context(|| format!("failed to write {}", ENV_FILE))?;

    println!("{} created from {} with a fresh secret key", ENV_FILE, ENV_TEMPLATE);
    Ok(())
}

/// Template with the placeholder secret replaced.
fn render_env(template: &str, secret: &str) -> String {
    let placeholder = format!("{}={}", SECRET_KEY_VAR, SECRET_PLACEHOLDER);
    let mut rendered: String = template
        .lines()
        .map(|line| {
            if line.trim() == placeholder {
                format!("{}={}", SECRET_KEY_VAR, secret)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    if template.ends_with('\n') {
        rendered.push('\n');
    }
    rendered
}

struct Check {
    label: &'static str,
    outcome: std::result::Result<(), String>,
}

impl Check {
    fn new(label: &'static str, outcome: std::result::Result<(), String>) -> Self {
        Self { label, outcome }
    }

    fn render(&self) -> String {
        match &self.outcome {
            Ok(()) => format!("✅ {}", self.label),
            Err(detail) => format!("❌ {}: {}", self.label, detail),
        }
    }
}

fn file_check(label: &'static str, path: &str) -> Check {
    let outcome = if Path::new(path).is_file() {
        Ok(())
    } else {
        Err(format!("{} not found", path))
    };
    Check::new(label, outcome)
}

async fn handle_check_ready() -> Result<()> {
    let mut checks = vec![
        file_check("Cargo manifest present", "Cargo.toml"),
        file_check("Environment template present", ENV_TEMPLATE),
    ];

    match config::load_config() {
        Ok(cfg) => {
            checks.push(Check::new("Configuration loads and validates", Ok(())));
            checks.extend(database_checks(&cfg).await);
            checks.push(cors_check(&cfg));
        }
        Err(e) => {
            checks.push(Check::new("Configuration loads and validates", Err(e.to_string())));
        }
    }

    for check in &checks {
        println!("{}", check.render());
    }

    let failed = checks.iter().filter(|c| c.outcome.is_err()).count();
    if failed > 0 {
        bail!("{} readiness check(s) failed", failed);
    }
    println!("All readiness checks passed");
    Ok(())
}

async fn database_checks(cfg: &AppConfig) -> Vec<Check> {
    let pool = match db::establish_connection_from_app_config(cfg).await {
        Ok(pool) => pool,
        Err(e) => return vec![Check::new("Database reachable", Err(e.to_string()))],
    };

    let mut checks = vec![Check::new(
        "Database reachable",
        db::check_connection(&pool).await.map_err(|e| e.to_string()),
    )];

    let migrations = match db::pending_migrations(&pool).await {
        Ok(pending) if pending.is_empty() => Ok(()),
        Ok(pending) => Err(format!("pending: {}", pending.join(", "))),
        Err(e) => Err(e.to_string()),
    };
    checks.push(Check::new("Migrations applied", migrations));

    let users = match user::Entity::find().count(&pool).await {
        Ok(0) => Err("no accounts; run `technet-cli create-user`".to_string()),
        Ok(_) => Ok(()),
        Err(e) => Err(e.to_string()),
    };
    checks.push(Check::new("At least one user account", users));

    if let Err(e) = db::close_pool(pool).await {
        debug!("closing readiness pool failed: {}", e);
    }
    checks
}

fn cors_check(cfg: &AppConfig) -> Check {
    let outcome = if cfg.is_development()
        || cfg.has_cors_allowed_origins()
        || cfg.cors_allow_any_origin
    {
        Ok(())
    } else {
        Err("set APP__CORS_ALLOWED_ORIGINS outside development".to_string())
    };
    Check::new("CORS origins configured", outcome)
}
