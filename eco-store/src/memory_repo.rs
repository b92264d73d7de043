use async_trait::async_trait;
use eco_core::{Order, OrderRepository, RepositoryError};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process order store for local runs and tests
#[derive(Default)]
pub struct MemoryOrderRepository {
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn save(&self, mut order: Order) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.write().await;

        match order.id.clone() {
            None => {
                let id = Uuid::new_v4().to_string();
                order.id = Some(id.clone());
                order.version = 1;
                orders.insert(id, order.clone());
            }
            Some(id) => {
                let stored_version = orders.get(&id).map(|o| o.version);
                if stored_version != Some(order.version) {
                    return Err(RepositoryError::Conflict {
                        id,
                        expected: order.version,
                    });
                }
                order.version += 1;
                orders.insert(id, order.clone());
            }
        }

        Ok(order)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.read().await.get(id).cloned())
    }
}
