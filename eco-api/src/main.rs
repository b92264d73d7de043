use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use eco_api::{app, metrics::{Metrics, MeteredPublisher}, AppState};
use eco_core::{EventPublisher, OrderRepository};
use eco_order::OrderService;
use eco_store::app_config::{Config, StoreBackend};
use eco_store::{DbClient, EventProducer, HttpCatalogClient, LoggingPublisher, MemoryOrderRepository, PgOrderRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eco_api=debug,eco_order=debug,eco_catalog=debug,eco_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting order service on port {}", config.server.port);

    let repository: Arc<dyn OrderRepository> = match config.store.backend {
        StoreBackend::Postgres => {
            let db = DbClient::new(&config.database)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Arc::new(PgOrderRepository::new(db.pool.clone()))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory order store, orders are lost on restart");
            Arc::new(MemoryOrderRepository::new())
        }
    };

    let broker: Arc<dyn EventPublisher> = if config.kafka.enabled {
        Arc::new(EventProducer::new(&config.kafka.brokers).context("Failed to create Kafka producer")?)
    } else {
        tracing::warn!("Kafka disabled, order events are only logged");
        Arc::new(LoggingPublisher)
    };

    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);
    let publisher = Arc::new(MeteredPublisher::new(broker, metrics.clone()));

    let catalog = Arc::new(HttpCatalogClient::new(&config.catalog).context("Failed to build catalog client")?);

    let orders = OrderService::new(catalog, repository, publisher).with_exchange(config.kafka.topic.clone());

    let app_state = AppState {
        orders: Arc::new(orders),
        metrics,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
