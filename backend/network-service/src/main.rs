use actix_cors::Cors;
use actix_middleware::{CorrelationIdMiddleware, Logging, MetricsMiddleware};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use network_service::db::{PgStore, StorageBackend, Stores};
use network_service::security::JwtKeys;
use network_service::{handlers, AppState, Config};
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Open the configured store and seed it when asked
async fn build_state(config: &Config, keys: Arc<JwtKeys>) -> anyhow::Result<AppState> {
    let stores = match config.storage.backend {
        StorageBackend::Memory => Stores::memory(),
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the postgres backend")?;
            let store = PgStore::connect(url, config.storage.max_connections)
                .await
                .context("failed to open PostgreSQL store")?;
            Stores::postgres(store)
        }
    };

    let state = AppState::new(stores, keys, config.auth.admin_token.clone());

    if config.storage.seed_demo_data {
        if state.accounts.count().await? == 0 {
            state.admin.seed_demo().await?;
        } else {
            tracing::info!("store already populated, skipping demo seed");
        }
    }

    Ok(state)
}

/// Aura network service
///
/// Serves the account, post and social routes under `/api`, plus `/metrics`.
/// Storage backend, seeding and token keys come from the environment; see
/// `Config`.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    // Container healthcheck: `network-service healthcheck`
    {
        let mut args = std::env::args();
        let _bin = args.next();
        if let Some(cmd) = args.next() {
            if cmd == "healthcheck" {
                let port = std::env::var("NETWORK_SERVICE_PORT").unwrap_or_else(|_| "5000".into());
                let url = format!("http://127.0.0.1:{port}/api/health");
                match reqwest::Client::new().get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => return Ok(()),
                    Ok(resp) => {
                        eprintln!("healthcheck HTTP status: {}", resp.status());
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"));
                    }
                    Err(e) => {
                        eprintln!("healthcheck HTTP error: {}", e);
                        return Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"));
                    }
                }
            }
        }
    }

    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        env = %config.app.env,
        backend = %config.storage.backend,
        "starting network-service"
    );

    let keys = config
        .jwt_keys()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let keys = Arc::new(keys);
    let state = build_state(&config, keys.clone())
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("{e:#}")))?;
    let state = web::Data::new(state);
    let allowed_origins = config.cors.allowed_origins.clone();

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let keys = keys.clone();
        App::new()
            .app_data(state.clone())
            .wrap(MetricsMiddleware)
            .wrap(Logging)
            .wrap(CorrelationIdMiddleware)
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(move |cfg| handlers::configure(cfg, keys))
            .default_service(web::to(handlers::not_found))
    })
    .bind(config.bind_address())?
    .shutdown_timeout(10)
    .run();

    tracing::info!(
        host = %config.app.host,
        port = config.app.port,
        "HTTP server listening"
    );

    let handle = server.handle();
    tokio::select! {
        result = server => result,
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            handle.stop(true).await;
            Ok(())
        }
    }
}
