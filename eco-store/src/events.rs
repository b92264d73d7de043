use async_trait::async_trait;
use eco_core::{EventPublisher, Order, PublishError};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, info};

/// Kafka-backed announcer; the routing key becomes the message key
#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl EventPublisher for EventProducer {
    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: &Order,
    ) -> Result<(), PublishError> {
        let failed = |reason: String| PublishError {
            topic: topic.to_string(),
            routing_key: routing_key.to_string(),
            reason,
        };

        let body = serde_json::to_string(payload).map_err(|e| failed(e.to_string()))?;
        let record = FutureRecord::to(topic).key(routing_key).payload(&body);

        let delivery = self
            .producer
            .send(record, Timeout::After(Duration::ZERO))
            .await
            .map_err(|(e, _)| failed(e.to_string()))?;

        debug!(
            topic,
            routing_key,
            order_id = ?payload.id,
            partition = delivery.partition,
            offset = delivery.offset,
            "Order event delivered"
        );
        Ok(())
    }
}

/// Publisher used when no broker is configured; events only reach the log
#[derive(Debug, Default, Clone)]
pub struct LoggingPublisher;

#[async_trait]
impl EventPublisher for LoggingPublisher {
    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: &Order,
    ) -> Result<(), PublishError> {
        info!(topic, routing_key, order_id = ?payload.id, status = %payload.status, "Order event (broker disabled)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_undeliverable_event_is_reported() {
        let producer = EventProducer::new("127.0.0.1:1").unwrap();
        let mut order = Order::new("u1".to_string(), vec![], dec!(12.5));
        order.id = Some("o1".to_string());

        let err = producer
            .publish("order.exchange", "order.created", &order)
            .await
            .unwrap_err();

        assert_eq!(err.topic, "order.exchange");
        assert_eq!(err.routing_key, "order.created");
    }
}
