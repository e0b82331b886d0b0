mod review;
mod status;
mod sweep;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use vendir_engine::MergeField;

#[derive(Debug, Parser)]
#[command(name = "vendir-cli")]
#[command(about = "Vendor directory import reconciliation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a reconciliation sweep over pending import records.
    Sweep {
        /// Resolve everything but write nothing.
        #[arg(long)]
        dry_run: bool,
        /// Process at most this many records.
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Show per-status queue counts.
    Status,
    /// Approve imports, materializing one vendor per record.
    Approve {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Reject imports with an optional shared reason.
    Reject {
        #[arg(required = true)]
        ids: Vec<Uuid>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Flag an import as a duplicate of an existing vendor.
    Duplicate { import_id: Uuid, vendor_id: Uuid },
    /// Merge an import into an existing vendor and reject the import.
    Merge {
        import_id: Uuid,
        vendor_id: Uuid,
        /// Force-select a field on top of the auto-fill.
        #[arg(long = "select", value_name = "FIELD")]
        select: Vec<MergeField>,
        /// Drop a field the auto-fill selected.
        #[arg(long = "deselect", value_name = "FIELD")]
        deselect: Vec<MergeField>,
        /// Print the decisions without applying them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Permanently delete import records. Destructive.
    Delete {
        #[arg(required = true)]
        ids: Vec<Uuid>,
        /// Confirm the delete. Without this flag the command only previews.
        #[arg(long)]
        yes: bool,
    },
    /// Database housekeeping.
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations.
    Migrate,
    /// Verify the database connection.
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config =
        vendir_core::AppConfig::from_env().map_err(|e| anyhow::anyhow!("configuration: {e}"))?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let pool_config = vendir_db::PoolConfig::from_app_config(&config);
    let pool = vendir_db::connect_pool(&config.database_url, pool_config).await?;
    let store = vendir_db::PgStore::new(pool.clone());

    match cli.command {
        Commands::Sweep { dry_run, limit } => {
            sweep::run_sweep_command(&store, &config, dry_run, limit).await?;
        }
        Commands::Status => status::run_status(&store).await?,
        Commands::Approve { ids } => review::run_approve(&store, &ids).await?,
        Commands::Reject { ids, reason } => {
            review::run_reject(&store, &ids, reason.as_deref()).await?;
        }
        Commands::Duplicate {
            import_id,
            vendor_id,
        } => review::run_duplicate(&store, import_id, vendor_id).await?,
        Commands::Merge {
            import_id,
            vendor_id,
            select,
            deselect,
            dry_run,
        } => {
            review::run_merge(&store, import_id, vendor_id, &select, &deselect, dry_run).await?;
        }
        Commands::Delete { ids, yes } => review::run_delete(&store, &config, &ids, yes).await?,
        Commands::Db { command } => match command {
            DbCommands::Migrate => {
                let applied = vendir_db::run_migrations(&pool).await?;
                println!("applied {applied} migrations");
            }
            DbCommands::Ping => {
                vendir_db::ping(&pool).await?;
                println!("database ok");
            }
        },
    }

    Ok(())
}
