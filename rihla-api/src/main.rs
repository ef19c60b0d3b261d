use std::net::SocketAddr;
use std::sync::Arc;

use rihla_api::state::{AppState, AuthConfig};
use rihla_api::{app, worker};
use rihla_store::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rihla_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = rihla_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Rihla API on port {}", config.server.port);

    let store = Arc::new(MemoryStore::new());

    let app_state = AppState::build(
        store,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    );

    worker::start_expiry_worker(
        app_state.clone(),
        config.business_rules.pending_booking_ttl_seconds,
        config.business_rules.expiry_sweep_interval_seconds,
    );
    worker::start_event_logger(app_state.clone());

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
