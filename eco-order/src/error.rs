use eco_catalog::PricingError;
use eco_core::{OrderStatus, RepositoryError, UnknownStatus};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Aggregated line rejections or a malformed request.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid product IDs: {0}")]
    InvalidProductIds(String),

    #[error("Order with id {0} not found")]
    NotFound(String),

    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order {0} was modified concurrently, retry the update")]
    ConcurrentModification(String),

    /// Catalog or order store could not complete the call.
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
}

impl OrderError {
    /// Client-class failures the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, OrderError::Unavailable(_))
    }
}

impl From<PricingError> for OrderError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Validation(msg) => OrderError::Validation(msg),
            PricingError::InvalidProductIds(msg) => OrderError::InvalidProductIds(msg),
            PricingError::CatalogUnavailable(msg) => OrderError::Unavailable(msg),
            other @ PricingError::TotalOutOfRange => OrderError::Validation(other.to_string()),
        }
    }
}

impl From<RepositoryError> for OrderError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { id, .. } => OrderError::ConcurrentModification(id),
            RepositoryError::Unavailable(msg) => OrderError::Unavailable(msg),
        }
    }
}
