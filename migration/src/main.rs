use sea_orm_migration::prelude::*;

/// Schema CLI for the metrics store, e.g. `cargo run -p migration -- up`.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    cli::run_cli(migration::Migrator).await;
}
