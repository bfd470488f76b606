//! Profile API - user profile service for the NFT market backend

use clap::Parser;
use profile_api::config::DatabaseConfig;
use profile_api::{run_server, ServiceConfig};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "profile-api")]
#[command(about = "User profile API for the NFT market backend")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "SERVICE_ADDRESS")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "5000", env = "SERVICE_PORT")]
    port: u16,

    /// Request timeout in seconds; requests never time out when unset
    #[arg(long, env = "TIMEOUT")]
    timeout: Option<u64>,

    /// Database host
    #[arg(long, default_value = "localhost", env = "DB_HOST")]
    db_host: String,

    /// Database user
    #[arg(long, default_value = "root", env = "DB_USER")]
    db_user: String,

    /// Database password
    #[arg(long, default_value = "", env = "DB_PASSWORD")]
    db_password: String,

    /// Database name
    #[arg(long, default_value = "market", env = "DB_NAME")]
    db_name: String,

    /// Secret for bearer-token verification
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Use the in-memory user store (for testing, data will not persist)
    #[arg(long, env = "MEMORY_STORE")]
    memory_store: bool,

    /// Enable debug logging
    #[arg(short, long, env = "DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("profile_api={log_level},tower_http=debug").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.memory_store {
        tracing::warn!("⚠️  using in-memory user store - data will NOT persist!");
    }
    if args.timeout.is_none() {
        tracing::warn!("TIMEOUT not set - requests will never be timed out");
    }

    let config = ServiceConfig {
        host: args.host,
        port: args.port,
        timeout: args.timeout.map(Duration::from_secs),
        database: DatabaseConfig {
            host: args.db_host,
            user: args.db_user,
            password: args.db_password,
            name: args.db_name,
        },
        jwt_secret: args.jwt_secret,
        memory_store: args.memory_store,
        ..Default::default()
    };

    run_server(config).await
}
