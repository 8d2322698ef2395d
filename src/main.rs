use authgate::{
    auth::{AuthService, SessionManager},
    cli::{Cli, Commands},
    config::ServerConfig,
    server::{api_router, service_router},
    state::ApiState,
    storage::{connect_pool, SqliteUserStore, UserStore},
};
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authgate=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Connect to database and initialize schema
    let pool = connect_pool(&config.database_url).await?;
    let store = SqliteUserStore::new(pool);
    store.initialize().await?;
    let user_store: Arc<dyn UserStore> = Arc::new(store);

    match cli.command {
        Some(Commands::User(cmd)) => cmd.execute(user_store).await,
        Some(Commands::Service) => {
            info!("🚀 Starting user authentication service v{}", VERSION);
            info!("   Database: {}", config.database_url);

            let auth = Arc::new(AuthService::new(user_store));
            serve(service_router(auth, &config), &config).await
        }
        Some(Commands::Api) | None => {
            info!("🚀 Starting API v{}", VERSION);
            info!("   Database: {}", config.database_url);
            info!("   Auth type: {:?}", config.auth_type);
            info!("   Session cookie: {}", config.session_name);
            info!("   Excluded paths: {:?}", config.excluded_paths);

            let sessions = SessionManager::new();
            let state = Arc::new(ApiState::new(config.clone(), user_store, sessions.clone()));
            let result = serve(api_router(state), &config).await;

            let dropped = sessions.clear();
            if dropped > 0 {
                info!("Dropped {} sessions on shutdown", dropped);
            }
            result
        }
    }
}

async fn serve(app: Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = config.bind_address().parse()?;
    info!("🎧 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
