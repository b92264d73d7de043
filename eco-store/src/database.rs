use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_order_total_column_keeps_full_scale() {
        let schema = include_str!("../../migrations/20250101000000_create_orders.sql");
        let column = schema
            .lines()
            .find(|l| l.trim_start().starts_with("total_price"))
            .unwrap();

        assert!(column.contains("NUMERIC NOT NULL"), "{}", column);
    }
}
