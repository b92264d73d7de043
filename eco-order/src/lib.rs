pub mod error;
pub mod manager;

pub use error::OrderError;
pub use manager::OrderService;
