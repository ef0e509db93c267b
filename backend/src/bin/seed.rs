//! Seed the demo data set.
//!
//! ```text
//! DATABASE_URL=postgres://… cargo run --bin seed -- --seed 42
//! ```
//!
//! Expects a freshly migrated or reset schema; rerunning against seeded data
//! fails on the uniqueness constraints.

use clap::Parser;
use tracing::info;

use backend::outbound::persistence::{DbPool, DieselSeedRepository, PoolConfig};
use backend::seeding::run_seed;

/// Seed the demo data set.
#[derive(Parser)]
struct Cli {
    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Seed for the deterministic account generator.
    #[arg(long, default_value_t = 1337)]
    seed: u64,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let pool = DbPool::new(PoolConfig::new(&cli.database_url)).await?;
    let repository = DieselSeedRepository::new(pool);

    let summary = run_seed(&repository, cli.seed).await?;
    info!(
        roles = summary.roles,
        permissions = summary.permissions,
        users = summary.users,
        notes = summary.notes,
        "seed complete"
    );
    Ok(())
}
