pub mod order;
pub mod repository;
pub mod events;

pub use order::{
    Order, OrderLine, OrderLineRequest, OrderRequest, OrderResponse, OrderStatus, UnknownStatus,
};
pub use repository::{OrderRepository, RepositoryError};
pub use events::{EventPublisher, OrderEvent, PublishError, ORDER_EXCHANGE};
