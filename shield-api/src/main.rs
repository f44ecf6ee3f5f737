use std::net::SocketAddr;
use std::sync::Arc;
use shield_api::{app, state::{AppState, AuthConfig}};
use shield_board::assistant::ChatBackend;
use shield_board::discovery::poll_interval;
use shield_core::repository::ShieldStore;
use shield_store::{app_config::Config, DbClient, PgShieldStore, ShieldApiClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shield_api=debug,shield_board=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Shield API on port {}", config.server.port);

    let db = DbClient::new(&config.database).await?;
    let store: Arc<dyn ShieldStore> = Arc::new(PgShieldStore::new(db.pool.clone()));
    let chat: Arc<dyn ChatBackend> = Arc::new(ShieldApiClient::new(&config.api.base_url)?);

    let interval = poll_interval(config.board.poll_interval_seconds);
    tracing::info!("Polling for open shifts every {:?}", interval);

    let app_state = AppState::new(
        store,
        chat,
        AuthConfig { secret: config.auth.jwt_secret.clone() },
        interval,
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
