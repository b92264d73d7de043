use std::sync::Arc;
use eco_order::OrderService;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub metrics: Arc<Metrics>,
}
