use clap::Subcommand;
use serde_json::json;

use crate::auth::PasswordHasher;
use crate::cli::{commands::load_config, utils::output_success, OutputFormat};
use crate::config::StoreBackend;
use crate::database::{open_store, seed::seed_demo_data, DatabaseManager};

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending schema migrations")]
    Migrate,

    #[command(about = "Insert demo staff and customers into empty tables")]
    Seed,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    if config.database.backend != StoreBackend::Postgres {
        anyhow::bail!("db commands require DATABASE_BACKEND=postgres");
    }

    match cmd {
        DbCommands::Migrate => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            output_success(output_format, "Migrations applied", None)
        }
        DbCommands::Seed => {
            let store = open_store(&config.database).await?;
            let report = seed_demo_data(store.as_ref(), &PasswordHasher::default()).await?;
            output_success(
                output_format,
                "Demo data seeded",
                Some(json!({ "employees": report.employees, "customers": report.customers })),
            )
        }
    }
}
