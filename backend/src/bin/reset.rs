//! Drop every application table.
//!
//! Tables fall in strict reverse-dependency order so the drops never trip a
//! foreign-key constraint.
//!
//! ```text
//! DATABASE_URL=postgres://… cargo run --bin reset
//! ```

use clap::Parser;
use diesel::{Connection, PgConnection, RunQueryDsl};
use tracing::info;

/// Reverse-dependency drop order.
const DROP_ORDER: [&str; 12] = [
    "verifications",
    "note_images",
    "notes",
    "user_images",
    "sessions",
    "connections",
    "passwords",
    "role_permissions",
    "permissions",
    "user_roles",
    "roles",
    "users",
];

/// Drop every application table.
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

    for table in DROP_ORDER {
        diesel::sql_query(format!("DROP TABLE IF EXISTS {table}")).execute(&mut conn)?;
        info!(table, "dropped");
    }
    Ok(())
}
