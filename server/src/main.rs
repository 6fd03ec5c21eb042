mod config;
mod dto;
mod http;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_db::{DatabaseSettings, DbPool, connect, connect_documents};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{DocumentStore, HrService, MongoStore, RelationalStore, SeaOrmStore, Seeder};
use tracing::info;

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "office-server", version, about = "Office HR records over SQL and MongoDB")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Seed both stores with the canonical departments and employees.
    Seed,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

struct Stores {
    pool: DbPool,
    relational: Arc<dyn RelationalStore>,
    document: Arc<dyn DocumentStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _obs = init_tracing(ObsConfig::from_env())?;
    let cli = Cli::parse();
    let app_config = Arc::new(AppConfig::load()?);
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, app_config).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
        },
        Command::Seed => run_seed().await,
    }
}

async fn setup_pool() -> Result<DbPool> {
    let settings = DatabaseSettings::from_env();
    connect(&settings).await.map_err(Into::into)
}

async fn open_stores() -> Result<Stores> {
    let settings = DatabaseSettings::from_env();
    let pool = connect(&settings).await?;
    let documents = connect_documents(&settings).await?;
    Ok(Stores {
        relational: Arc::new(SeaOrmStore::new(pool.clone())),
        document: Arc::new(MongoStore::new(&documents)),
        pool,
    })
}

async fn seed(stores: &Stores) -> Result<()> {
    let report = Seeder::new(stores.relational.clone(), stores.document.clone())
        .run()
        .await
        .context("seeding failed")?;
    if report.is_noop() {
        info!("stores already seeded");
    }
    Ok(())
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let stores = open_stores().await?;
    ensure_migrations(&stores.pool, cmd.allow_dirty).await?;
    if config.skip_seed {
        info!("SKIP_SEED set; leaving stores untouched");
    } else {
        seed(&stores).await?;
    }

    let service = Arc::new(HrService::new(
        stores.relational,
        stores.document,
        config.store_timeout,
    ));
    let state = AppState {
        departments: service.clone(),
        employees: service,
        config,
    };
    http::serve(cmd.into(), state).await
}

async fn run_seed() -> Result<()> {
    let stores = open_stores().await?;
    ensure_migrations(&stores.pool, false).await?;
    seed(&stores).await
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `cargo run -p server -- migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}
