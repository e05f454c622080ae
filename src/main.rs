use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod error;
mod repositories;
mod routes;
mod sanitize;
mod seed;
mod server;
mod services;
mod validation;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("starting agenda-server");

    let pool = db::connect(&config.database.path).await?;
    db::init_database(&pool).await?;

    if std::env::args().any(|arg| arg == "seed") {
        seed::run(&pool).await?;
        return Ok(());
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Failed to parse server address: {}", e))?;

    let state = server::AppState::new(pool, config);
    server::start_server(addr, state).await
}
