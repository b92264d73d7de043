pub mod app_config;
pub mod database;
pub mod order_repo;
pub mod memory_repo;
pub mod events;
pub mod catalog_client;

pub use database::DbClient;
pub use order_repo::PgOrderRepository;
pub use memory_repo::MemoryOrderRepository;
pub use events::{EventProducer, LoggingPublisher};
pub use catalog_client::HttpCatalogClient;
