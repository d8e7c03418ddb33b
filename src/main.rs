//! Payflow server binary.
//!
//! Loads and validates configuration, connects storage, wires the adapters
//! and serves the API until SIGINT/SIGTERM, then drains background email
//! and analytics tasks.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use payflow::adapters::analytics::{MetaConversionsProvider, NoopAnalyticsProvider};
use payflow::adapters::email::ResendEmailProvider;
use payflow::adapters::http::app_router;
use payflow::adapters::identity::SupabaseIdentityStore;
use payflow::bootstrap::{self, Collaborators, Stores};
use payflow::config::{AnalyticsConfig, AppConfig, ServerConfig};
use payflow::ports::AnalyticsProvider;

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if server.is_production() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn connect_stores(config: &AppConfig) -> Result<Stores, Box<dyn Error>> {
    if !config.database.is_configured() {
        tracing::warn!("No database configured, using in-memory stores");
        return Ok(Stores::in_memory());
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    tracing::info!("Database pool created");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(Stores::postgres(pool))
}

fn analytics_provider(
    config: &AnalyticsConfig,
) -> Result<Arc<dyn AnalyticsProvider>, reqwest::Error> {
    match (config.enabled, &config.pixel_id, &config.access_token) {
        (true, Some(pixel_id), Some(access_token)) => {
            let provider = MetaConversionsProvider::new(
                &config.api_url,
                &config.api_version,
                pixel_id,
                SecretString::new(access_token.clone()),
                config.timeout(),
            )?
            .with_test_event_code(config.test_event_code.clone());
            Ok(Arc::new(provider))
        }
        _ => Ok(Arc::new(NoopAnalyticsProvider)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load_validated()?;
    init_tracing(&config.server);

    let stores = connect_stores(&config).await?;
    let collaborators = Collaborators {
        identities: Arc::new(SupabaseIdentityStore::new(
            config.identity.supabase_url.clone(),
            SecretString::new(config.identity.service_role_key.clone()),
            config.identity.timeout(),
        )?),
        email: Arc::new(ResendEmailProvider::from_config(&config.email)?),
        analytics: analytics_provider(&config.analytics)?,
    };

    let app = bootstrap::build(&config, stores, collaborators);

    tokio::spawn(bootstrap::run_token_cleanup(
        app.tokens.clone(),
        Duration::from_secs(config.server.token_cleanup_interval_secs),
        config.identity.token_retention_days,
    ));

    let router = app_router(app.state, app.request_timeout);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "payflow listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let drained = app.tasks.drain().await;
    tracing::info!(drained, "Background tasks drained, exiting");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
