//! Migration CLI tool.
//!
//! Reads `DATABASE_URL` (a `.env` file is honoured) and accepts the usual
//! `up`, `down`, `status`, `fresh` and `refresh` subcommands. Log verbosity
//! follows `RUST_LOG`; `cli::run_cli` installs the subscriber itself.

use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(migration::Migrator).await;
}
