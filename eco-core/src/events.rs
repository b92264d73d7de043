use async_trait::async_trait;
use crate::order::Order;

/// Default topic (exchange) all order events are published to
pub const ORDER_EXCHANGE: &str = "order.exchange";

/// Order lifecycle events announced downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    Created,
    Updated,
}

impl OrderEvent {
    pub fn routing_key(&self) -> &'static str {
        match self {
            OrderEvent::Created => "order.created",
            OrderEvent::Updated => "order.updated",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to publish {routing_key} to {topic}: {reason}")]
pub struct PublishError {
    pub topic: String,
    pub routing_key: String,
    pub reason: String,
}

/// Best-effort publisher. Callers do not retry and do not wait for
/// downstream acknowledgement beyond the broker handing the message off.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: &Order,
    ) -> Result<(), PublishError>;
}
