use std::sync::Arc;

use salvo::conn::TcpListener;
use salvo::{Listener, Router, Service};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use elevate_app::app::api::routes;
use elevate_app::middleware::cors::cors_handler;
use elevate_app::reconciler::spawn_reconciler;
use elevate_app::services_handler::ServicesHandler;
use elevate_core::config::load_config;
use elevate_db::db::{connection::create_pool, migrate::run_migrations};
use elevate_db::store::PgProfileStore;
use elevate_service::identity::GoTrueGateway;
use elevate_service::policy::PolicyEngine;
use elevate_service::{Limits, ServiceDeps};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Elevate account service");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    run_migrations(&config.database.url).await?;

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
        config.database.timeout(),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    let deps = ServiceDeps::new(
        Arc::new(PgProfileStore::new(pool)),
        Arc::new(GoTrueGateway::new(&config.identity)?),
        PolicyEngine::new().await?,
        Limits::from_settings(&config),
    );

    if config.reconciliation.enabled {
        let _reconciler = spawn_reconciler(deps.clone(), config.reconciliation.interval());
    } else {
        tracing::warn!("Reconciliation sweep disabled; orphaned invitations need POST /api/app/reconcile");
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(ServicesHandler { deps })
        .push(routes());
    let service = Service::new(router).hoop(cors_handler(&config.server));

    tracing::info!(origin = %config.server.origin(), "Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(service).await;

    Ok(())
}
