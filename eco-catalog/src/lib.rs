pub mod product;
pub mod pricing;

pub use product::{
    CatalogError, CatalogErrorResponse, CatalogGateway, ProductDetails, ProductDetailsList,
    ProductIdRequest,
};
pub use pricing::{total_price, LineOutcome, PricedLine, PricingEngine, PricingError};
