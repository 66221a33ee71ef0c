use anyhow::{ensure, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use seedbed::clock::SystemClock;
use seedbed::db::{self, SqlStore};
use seedbed::registry::{EntityDescriptor, Registry};
use seedbed::schema::{Column, SqlType, Table};
use seedbed::types::FixtureRow;
use seedbed::{migrate_db, seeder, waiter, BootstrapConfig};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct AppArg {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Apply schemas, wait for convergence, seed defaults
    Migrate {
        /// Drop DB before migrating
        #[clap(short, long)]
        clean: bool,
        /// Drop DB before migrating in release environment
        #[clap(long)]
        force_delete_all_db: bool,
    },
    /// Wait until every registered table is queryable
    Check,
    /// Delete all rows, keeping the tables
    Truncate,
    /// Drop every registered table
    Drop {
        #[clap(long)]
        force: bool,
    },
    /// Seed default fixture rows only
    Seed,
}

fn users_fixtures() -> Vec<FixtureRow> {
    vec![FixtureRow::new()
        .set("id", 1)
        .set("name", "admin")
        .set("email", "admin@localhost")]
}

fn service_registry() -> Result<Registry> {
    let mut registry = Registry::new();
    registry.register(
        EntityDescriptor::new(
            Table::new("users")
                .column(
                    "id",
                    Column::new(SqlType::BigInt).not_null().auto_increment(),
                )
                .column("name", Column::new(SqlType::Varchar(191)).not_null())
                .column("email", Column::new(SqlType::Varchar(191)).not_null())
                .column("created_at", Column::new(SqlType::DateTime))
                .primary_key(&["id"])
                .unique("uq_users_email", &["email"]),
        )
        .with_fixtures(users_fixtures),
    )?;
    registry.register(EntityDescriptor::new(
        Table::new("sessions")
            .column("id", Column::new(SqlType::Varchar(64)).not_null())
            .column("user_id", Column::new(SqlType::BigInt).not_null())
            .column("expires_at", Column::new(SqlType::DateTime).not_null())
            .primary_key(&["id"])
            .index("idx_sessions_user", &["user_id"]),
    ))?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let arg: AppArg = AppArg::parse();
    let registry = service_registry()?;
    let config = BootstrapConfig::from_env()?;
    let clock = SystemClock;

    match arg.command {
        Command::Migrate {
            clean,
            force_delete_all_db,
        } => {
            if clean {
                ensure!(
                    force_delete_all_db || cfg!(debug_assertions),
                    "clean migrate is debug environment only"
                );
            }
            db::reset_database(clean).await?;
            let store = SqlStore::connect().await?;
            migrate_db(&store, &registry, &config, &clock).await?;
        }
        Command::Check => {
            let store = SqlStore::connect().await?;
            waiter::wait_for_migration(&store, &registry, &config, &clock).await?;
        }
        Command::Truncate => {
            let store = SqlStore::connect().await?;
            waiter::truncate(&store, &registry).await;
        }
        Command::Drop { force } => {
            ensure!(
                force || cfg!(debug_assertions),
                "drop is debug environment only"
            );
            let store = SqlStore::connect().await?;
            waiter::drop_all(&store, &registry).await?;
        }
        Command::Seed => {
            let store = SqlStore::connect().await?;
            seeder::seed_defaults(&store, &registry).await?;
        }
    }
    Ok(())
}
