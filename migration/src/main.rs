//! `migration` CLI for the weather-db schema (`up`, `down`, `status`, `fresh`).

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    // DATABASE_URL may come from a local .env file
    dotenvy::dotenv().ok();
    cli::run_cli(migration::Migrator).await;
}
