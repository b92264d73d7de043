use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eco_core::{Order, OrderLine, OrderRepository, OrderStatus, RepositoryError};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// Orders kept as one row per document, lines stored as JSONB
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, mut order: Order) -> Result<Order, RepositoryError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, lines, total_price, status, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, 1, $6, $7)
            "#,
        )
        .bind(&id)
        .bind(&order.user_id)
        .bind(Json(&order.lines))
        .bind(order.total_price)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        order.id = Some(id);
        order.version = 1;
        Ok(order)
    }

    /// Full-document replace, guarded by the version the caller read
    async fn replace(&self, id: String, mut order: Order) -> Result<Order, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET user_id = $2, lines = $3, total_price = $4, status = $5,
                created_at = $6, updated_at = $7, version = version + 1
            WHERE id = $1 AND version = $8
            "#,
        )
        .bind(&id)
        .bind(&order.user_id)
        .bind(Json(&order.lines))
        .bind(order.total_price)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.version)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict {
                id,
                expected: order.version,
            });
        }

        order.version += 1;
        order.id = Some(id);
        Ok(order)
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    lines: Json<Vec<OrderLine>>,
    total_price: Decimal,
    status: String,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::Unavailable(format!("order {} is unreadable: {}", row.id, e))
        })?;

        Ok(Order {
            id: Some(row.id),
            user_id: row.user_id,
            lines: row.lines.0,
            total_price: row.total_price,
            status,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn save(&self, order: Order) -> Result<Order, RepositoryError> {
        match order.id.clone() {
            None => self.insert(order).await,
            Some(id) => self.replace(id, order).await,
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, RepositoryError> {
        debug!(order_id = id, "Loading order");

        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, lines, total_price, status, version, created_at, updated_at FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(Order::try_from).transpose()
    }
}

fn unavailable(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}
