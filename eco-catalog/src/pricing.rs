use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use eco_core::{OrderLine, OrderLineRequest};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::product::{CatalogError, CatalogGateway, ProductDetails};

/// A validated line together with the unit price it was validated at
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub line: OrderLine,
    pub unit_price: Decimal,
}

/// Per-line result of validation
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Validated(PricedLine),
    Rejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    /// One or more lines were rejected; every reason, joined with "; ".
    #[error("{0}")]
    Validation(String),

    #[error("Invalid product IDs: {0}")]
    InvalidProductIds(String),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Order total exceeds the supported range.")]
    TotalOutOfRange,
}

impl From<CatalogError> for PricingError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidRequest(msg) => PricingError::InvalidProductIds(msg),
            CatalogError::Unavailable(msg) => PricingError::CatalogUnavailable(msg),
        }
    }
}

/// Validates order lines against the catalog and prices them
pub struct PricingEngine {
    catalog: Arc<dyn CatalogGateway>,
}

impl PricingEngine {
    pub fn new(catalog: Arc<dyn CatalogGateway>) -> Self {
        Self { catalog }
    }

    /// Validate and price every requested line with a single catalog round trip.
    ///
    /// All lines are classified before deciding: either every line validates
    /// and the priced lines come back in request order, or the caller gets one
    /// `PricingError::Validation` listing every rejection in request order.
    pub async fn evaluate(
        &self,
        user_id: &str,
        lines: &[OrderLineRequest],
    ) -> Result<Vec<PricedLine>, PricingError> {
        if user_id.trim().is_empty() {
            return Err(PricingError::Validation("User id must not be empty.".to_string()));
        }
        if lines.is_empty() {
            return Err(PricingError::Validation(
                "Order must contain at least one product.".to_string(),
            ));
        }

        let lines: Vec<OrderLineRequest> = lines
            .iter()
            .map(|l| OrderLineRequest::new(l.product_id.trim(), l.quantity))
            .collect();

        let product_ids = distinct_product_ids(&lines);
        info!(user_id, ?product_ids, "Fetching product details");

        let details = if product_ids.is_empty() {
            Vec::new()
        } else {
            self.catalog.fetch_details(&product_ids).await?
        };
        debug!(found = details.len(), requested = product_ids.len(), "Catalog answered");

        if let Some(bad) = details.iter().find(|p| p.price < Decimal::ZERO || p.stock < 0) {
            return Err(CatalogError::Unavailable(format!(
                "catalog returned product {} with price {} and stock {}",
                bad.id, bad.price, bad.stock
            ))
            .into());
        }

        let lookup: HashMap<&str, &ProductDetails> =
            details.iter().map(|p| (p.id.as_str(), p)).collect();

        let mut priced = Vec::with_capacity(lines.len());
        let mut rejections = Vec::new();

        for line in &lines {
            match classify(&lookup, line) {
                LineOutcome::Validated(p) => priced.push(p),
                LineOutcome::Rejected(reason) => rejections.push(reason),
            }
        }

        if !rejections.is_empty() {
            return Err(PricingError::Validation(rejections.join("; ")));
        }

        Ok(priced)
    }
}

/// Deduplicated, non-empty ids in order of first occurrence
fn distinct_product_ids(lines: &[OrderLineRequest]) -> Vec<String> {
    let mut seen = HashSet::new();
    lines
        .iter()
        .map(|l| l.product_id.as_str())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(String::from)
        .collect()
}

pub fn classify(lookup: &HashMap<&str, &ProductDetails>, request: &OrderLineRequest) -> LineOutcome {
    let id = &request.product_id;

    if request.quantity <= 0 {
        return LineOutcome::Rejected(format!(
            "Invalid quantity for product {}: {}.",
            id, request.quantity
        ));
    }

    let Some(product) = lookup.get(id.as_str()) else {
        return LineOutcome::Rejected(format!("Product {} not found.", id));
    };

    if product.stock < request.quantity {
        return LineOutcome::Rejected(format!(
            "Insufficient stock for product {}. Available: {}, Requested: {}.",
            id, product.stock, request.quantity
        ));
    }

    LineOutcome::Validated(PricedLine {
        line: OrderLine {
            product_id: id.clone(),
            quantity: request.quantity,
        },
        unit_price: product.price,
    })
}

/// Sum of unit price × quantity; fails instead of overflowing
pub fn total_price(lines: &[PricedLine]) -> Result<Decimal, PricingError> {
    lines.iter().try_fold(Decimal::ZERO, |acc, p| {
        p.unit_price
            .checked_mul(Decimal::from(p.line.quantity))
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or(PricingError::TotalOutOfRange)
    })
}
