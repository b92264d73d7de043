use std::sync::Arc;

use eco_catalog::{total_price, CatalogGateway, PricingEngine};
use eco_core::{
    EventPublisher, Order, OrderEvent, OrderRepository, OrderRequest, OrderResponse, OrderStatus,
    ORDER_EXCHANGE,
};
use tracing::{info, warn};

use crate::error::OrderError;

/// Orchestrates validation, persistence and announcement of orders
pub struct OrderService {
    pricing: PricingEngine,
    repository: Arc<dyn OrderRepository>,
    publisher: Arc<dyn EventPublisher>,
    exchange: String,
}

impl OrderService {
    pub fn new(
        catalog: Arc<dyn CatalogGateway>,
        repository: Arc<dyn OrderRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            pricing: PricingEngine::new(catalog),
            repository,
            publisher,
            exchange: ORDER_EXCHANGE.to_string(),
        }
    }

    /// Publish to a different topic than `order.exchange`
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    /// Validate, price, persist and announce a new order.
    ///
    /// Nothing is saved or published unless every requested line validates.
    pub async fn create_order(&self, request: OrderRequest) -> Result<OrderResponse, OrderError> {
        let priced = self.pricing.evaluate(&request.user_id, &request.lines).await?;
        let total = total_price(&priced)?;

        let order = Order::new(
            request.user_id.trim().to_string(),
            priced.into_iter().map(|p| p.line).collect(),
            total,
        );

        let saved = self.repository.save(order).await?;
        info!(order_id = ?saved.id, total = %saved.total_price, "Order created");

        self.announce(OrderEvent::Created, &saved).await;
        respond(&saved)
    }

    /// Get an order by ID. Absence is `Ok(None)`, not an error.
    pub async fn get_order_by_id(&self, id: &str) -> Result<Option<Order>, OrderError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Move an order to `new_status` if the lifecycle allows it.
    ///
    /// Only `status` and `updated_at` change; the replace is rejected if the
    /// stored order changed since it was read.
    pub async fn update_order_status(
        &self,
        id: &str,
        new_status: &str,
    ) -> Result<OrderResponse, OrderError> {
        let mut order = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;

        let next: OrderStatus = new_status.parse()?;
        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        order.update_status(next);
        let saved = self.repository.save(order).await?;
        info!(order_id = id, status = %saved.status, "Order status updated");

        self.announce(OrderEvent::Updated, &saved).await;
        respond(&saved)
    }

    async fn announce(&self, event: OrderEvent, order: &Order) {
        if let Err(e) = self
            .publisher
            .publish(&self.exchange, event.routing_key(), order)
            .await
        {
            warn!(order_id = ?order.id, error = %e, "Order event was not delivered");
        }
    }
}

fn respond(order: &Order) -> Result<OrderResponse, OrderError> {
    let order_id = order.id.clone().ok_or_else(|| {
        OrderError::Unavailable("order store returned an order without an id".to_string())
    })?;

    Ok(OrderResponse {
        order_id,
        status: order.status.to_string(),
    })
}
