use async_trait::async_trait;
use eco_catalog::{
    CatalogError, CatalogErrorResponse, CatalogGateway, ProductDetails, ProductDetailsList,
    ProductIdRequest,
};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::app_config::CatalogConfig;

/// Catalog service client, `POST /products/details`
#[derive(Clone)]
pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .build()?;

        debug!(
            url = %config.url,
            connect_timeout = config.connect_timeout_secs,
            read_timeout = config.read_timeout_secs,
            "Catalog client configured"
        );

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl CatalogGateway for HttpCatalogClient {
    async fn fetch_details(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<ProductDetails>, CatalogError> {
        let url = format!("{}/products/details", self.base_url);
        let body = ProductIdRequest {
            product_ids: product_ids.to_vec(),
        };

        info!("Sending POST request to /products/details");
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            error!("An error occurred while fetching product details: {}", e);
            CatalogError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        info!("Received response with status code: {}", status);

        if status == StatusCode::BAD_REQUEST {
            let raw = response.text().await.unwrap_or_default();
            error!("Bad Request: {}", raw);
            let message = serde_json::from_str::<CatalogErrorResponse>(&raw)
                .ok()
                .and_then(|e| e.message.or(e.error))
                .unwrap_or(raw);
            return Err(CatalogError::InvalidRequest(message));
        }

        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!(
                "catalog responded with {}",
                status
            )));
        }

        let list: ProductDetailsList = response
            .json()
            .await
            .map_err(|e| CatalogError::Unavailable(format!("unreadable catalog response: {}", e)))?;
        debug!(products = list.products.len(), "Response body decoded");

        Ok(list.products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::post, Json, Router};
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    async fn spawn_catalog(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(url: String, api_key: Option<&str>) -> HttpCatalogClient {
        HttpCatalogClient::new(&CatalogConfig {
            url,
            connect_timeout_secs: 1,
            read_timeout_secs: 2,
            api_key: api_key.map(String::from),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_known_products() {
        let router = Router::new().route(
            "/products/details",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(body, json!({"productIds": ["p1", "p9"]}));
                assert_eq!(headers.get("x-api-key").unwrap(), "secret");
                Json(json!({
                    "products": [{"id": "p1", "name": "Product 1", "price": 10.5, "stock": 100}]
                }))
            }),
        );
        let url = spawn_catalog(router).await;

        let products = client(format!("{}/", url), Some("secret"))
            .fetch_details(&["p1".to_string(), "p9".to_string()])
            .await
            .unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "p1");
        assert_eq!(products[0].price, dec!(10.5));
        assert_eq!(products[0].stock, 100);
    }

    #[tokio::test]
    async fn test_bad_request_maps_to_invalid_request() {
        let router = Router::new().route(
            "/products/details",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Bad Request", "message": "Malformed id: x!"})),
                )
            }),
        );
        let url = spawn_catalog(router).await;

        let err = client(url, None).fetch_details(&["x!".to_string()]).await.unwrap_err();

        match err {
            CatalogError::InvalidRequest(msg) => assert_eq!(msg, "Malformed id: x!"),
            other => panic!("expected invalid request, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let router = Router::new().route(
            "/products/details",
            post(|| async { axum::http::StatusCode::SERVICE_UNAVAILABLE }),
        );
        let url = spawn_catalog(router).await;

        let err = client(url, None).fetch_details(&["p1".to_string()]).await.unwrap_err();

        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = client(url, None).fetch_details(&["p1".to_string()]).await.unwrap_err();

        assert!(matches!(err, CatalogError::Unavailable(_)));
    }
}
