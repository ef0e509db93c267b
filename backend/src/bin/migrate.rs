//! Apply pending schema migrations.
//!
//! ```text
//! DATABASE_URL=postgres://… cargo run --bin migrate
//! ```

use clap::Parser;
use color_eyre::eyre::eyre;
use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Apply pending schema migrations.
#[derive(Parser)]
struct Cli {
    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut conn = PgConnection::establish(&cli.database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| eyre!("migration failed: {err}"))?;

    if applied.is_empty() {
        info!("schema is up to date");
    }
    for version in applied {
        info!(%version, "applied migration");
    }
    Ok(())
}
