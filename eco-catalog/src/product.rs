use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of a catalog product, valid for a single request only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDetails {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

/// Body of `POST /products/details`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdRequest {
    pub product_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDetailsList {
    pub products: Vec<ProductDetails>,
}

/// Error body the catalog sends with a 400
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogErrorResponse {
    pub error: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog could not be reached or answered with a server error.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// The catalog rejected the request itself.
    #[error("Invalid catalog request: {0}")]
    InvalidRequest(String),
}

/// Batched lookup of product details.
///
/// Ids the catalog does not know are left out of the result; absence is how
/// "not found" is reported, not an error.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn fetch_details(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<ProductDetails>, CatalogError>;
}
