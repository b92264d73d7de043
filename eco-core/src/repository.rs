use async_trait::async_trait;
use crate::order::Order;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    /// A replace carried a version that no longer matches the stored document.
    #[error("Order {id} was modified concurrently (expected version {expected})")]
    Conflict {
        id: String,
        expected: i64,
    },
}

/// Repository trait for order data access
///
/// `save` inserts and assigns an id when the order has none, otherwise it
/// replaces the whole stored document. A replace only succeeds when
/// `order.version` equals the stored version; the returned order carries the
/// new version.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn save(&self, order: Order) -> Result<Order, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, RepositoryError>;
}
