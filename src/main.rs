use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

use shopgate::auth::{RevocationCache, TokenCodec};
use shopgate::configuration::get_configuration;
use shopgate::startup::{run, AppState};
use shopgate::store::{PgIdentityStore, PgProductStore};
use shopgate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = get_configuration()
        .map_err(|e| {
            tracing::error!("Failed to read configuration: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
        })?;
    configuration.validate().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;
    tracing::info!("Database connection pool created successfully");

    let revocations = Arc::new(RevocationCache::new());
    let _sweeper = revocations.spawn_sweeper(configuration.auth.sweep_interval());

    let state = AppState {
        codec: Arc::new(TokenCodec::new(&configuration.jwt)),
        revocations,
        identities: Arc::new(PgIdentityStore::new(pool.clone())),
        products: Arc::new(PgProductStore::new(pool)),
        public_operations: configuration.auth.public_operations.clone(),
    };

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, state)?.await
}
