use std::net::SocketAddr;
use std::sync::Arc;

use parkwise_api::auth::password::hash_password;
use parkwise_api::config::{LogFormat, ServerConfig};
use parkwise_api::router::build_app_router;
use parkwise_api::state::AppState;
use parkwise_core::roles::UserRole;
use parkwise_db::bootstrap;
use parkwise_db::models::user::CreateUser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = parkwise_db::create_pool(&database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!(max_connections = config.db_max_connections, "Database connection pool created");

    parkwise_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    parkwise_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Bootstrap ---
    let report = bootstrap::normalize(&pool)
        .await
        .expect("Failed to reconcile lot occupancy");
    tracing::info!(lots_reconciled = report.lots_reconciled, "Lot occupancy reconciled");

    if let Some(password) = &config.bootstrap.admin_password {
        let admin = CreateUser {
            username: config.bootstrap.admin_username.clone(),
            password_hash: hash_password(password).expect("Failed to hash admin password"),
            role: UserRole::Admin,
        };
        bootstrap::ensure_user(&pool, &admin)
            .await
            .expect("Failed to create bootstrap admin");
    } else {
        tracing::info!("ADMIN_PASSWORD not set, skipping bootstrap admin");
    }

    if config.bootstrap.seed_demo_lots {
        bootstrap::seed_demo_lots(&pool)
            .await
            .expect("Failed to seed demo lots");
    }

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "parkwise_api=debug,parkwise_db=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
