use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::State, http::header, response::IntoResponse};
use eco_core::{EventPublisher, Order, PublishError};
use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

use crate::error::AppError;
use crate::state::AppState;

/// Prometheus counters for the order service, scraped via /metrics
pub struct Metrics {
    registry: Registry,
    pub orders_created: IntCounter,
    pub status_updates: IntCounter,
    pub validation_failures: IntCounter,
    pub publish_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::with_opts(Opts::new(
            "orders_created_total",
            "Orders successfully created",
        ))?;
        let status_updates = IntCounter::with_opts(Opts::new(
            "order_status_updates_total",
            "Order status changes persisted",
        ))?;
        let validation_failures = IntCounter::with_opts(Opts::new(
            "order_validation_failures_total",
            "Order requests rejected as malformed or invalid",
        ))?;
        let publish_failures = IntCounter::with_opts(Opts::new(
            "order_event_publish_failures_total",
            "Order events the broker did not accept",
        ))?;

        registry.register(Box::new(orders_created.clone()))?;
        registry.register(Box::new(status_updates.clone()))?;
        registry.register(Box::new(validation_failures.clone()))?;
        registry.register(Box::new(publish_failures.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            status_updates,
            validation_failures,
            publish_failures,
        })
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Counts publish failures before handing them back to the caller
pub struct MeteredPublisher {
    inner: Arc<dyn EventPublisher>,
    metrics: Arc<Metrics>,
}

impl MeteredPublisher {
    pub fn new(inner: Arc<dyn EventPublisher>, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }
}

#[async_trait]
impl EventPublisher for MeteredPublisher {
    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: &Order,
    ) -> Result<(), PublishError> {
        let result = self.inner.publish(topic, routing_key, payload).await;
        if result.is_err() {
            self.metrics.publish_failures.inc();
        }
        result
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render().map_err(anyhow::Error::from)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
