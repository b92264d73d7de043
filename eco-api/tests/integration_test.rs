use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use eco_api::metrics::{MeteredPublisher, Metrics};
use eco_api::{app, AppState};
use eco_catalog::{CatalogError, CatalogGateway, ProductDetails};
use eco_core::{EventPublisher, Order, OrderRepository, PublishError, RepositoryError};
use eco_order::OrderService;
use eco_store::MemoryOrderRepository;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

struct FixedCatalog {
    products: Vec<ProductDetails>,
    reject_with: Option<String>,
}

#[async_trait]
impl CatalogGateway for FixedCatalog {
    async fn fetch_details(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<ProductDetails>, CatalogError> {
        if let Some(msg) = &self.reject_with {
            return Err(CatalogError::InvalidRequest(msg.clone()));
        }
        Ok(self
            .products
            .iter()
            .filter(|p| product_ids.contains(&p.id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct CapturingPublisher {
    events: Mutex<Vec<(String, Order)>>,
    fail: bool,
}

#[async_trait]
impl EventPublisher for CapturingPublisher {
    async fn publish(
        &self,
        topic: &str,
        routing_key: &str,
        payload: &Order,
    ) -> Result<(), PublishError> {
        self.events
            .lock()
            .unwrap()
            .push((routing_key.to_string(), payload.clone()));
        if self.fail {
            return Err(PublishError {
                topic: topic.to_string(),
                routing_key: routing_key.to_string(),
                reason: "broker unreachable".to_string(),
            });
        }
        Ok(())
    }
}

struct UnreachableStore;

#[async_trait]
impl OrderRepository for UnreachableStore {
    async fn save(&self, _order: Order) -> Result<Order, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<Order>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }
}

struct TestApp {
    router: Router,
    repo: Arc<MemoryOrderRepository>,
    publisher: Arc<CapturingPublisher>,
}

fn test_app_with(catalog: FixedCatalog, publisher: CapturingPublisher) -> TestApp {
    let repo = Arc::new(MemoryOrderRepository::new());
    let publisher = Arc::new(publisher);
    let metrics = Arc::new(Metrics::new().unwrap());

    let orders = OrderService::new(
        Arc::new(catalog),
        repo.clone(),
        Arc::new(MeteredPublisher::new(publisher.clone(), metrics.clone())),
    );

    let router = app(AppState {
        orders: Arc::new(orders),
        metrics,
    });

    TestApp { router, repo, publisher }
}

fn catalog() -> FixedCatalog {
    FixedCatalog {
        products: vec![
            ProductDetails { id: "p1".into(), name: "Product 1".into(), price: dec!(10), stock: 100 },
            ProductDetails { id: "p2".into(), name: "Product 2".into(), price: dec!(20), stock: 200 },
            ProductDetails { id: "p3".into(), name: "Product 3".into(), price: dec!(5), stock: 2 },
        ],
        reject_with: None,
    }
}

fn test_app() -> TestApp {
    test_app_with(catalog(), CapturingPublisher::default())
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

#[tokio::test]
async fn test_create_then_fetch_order() {
    let t = test_app();

    let (status, body) = send(
        &t.router,
        "POST",
        "/orders",
        Some(json!({"userId": "u1", "lines": [{"productId": "p1", "quantity": 2}, {"productId": "p2", "quantity": 1}]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "Pending");
    let order_id = body["orderId"].as_str().unwrap().to_string();

    let (status, order) = send(&t.router, "GET", &format!("/orders/{}", order_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["id"], order_id.as_str());
    assert_eq!(order["userId"], "u1");
    assert_eq!(order["totalPrice"], 40.0);
    assert_eq!(order["lines"].as_array().unwrap().len(), 2);

    let events = t.publisher.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "order.created");
}

#[tokio::test]
async fn test_legacy_products_field_is_accepted() {
    let t = test_app();

    let (status, _) = send(
        &t.router,
        "POST",
        "/orders",
        Some(json!({"userId": "u1", "products": [{"productId": "p1", "quantity": 1}]})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(t.repo.len().await, 1);
}

#[tokio::test]
async fn test_invalid_lines_return_bad_request_with_all_reasons() {
    let t = test_app();

    let (status, body) = send(
        &t.router,
        "POST",
        "/orders",
        Some(json!({"userId": "u1", "lines": [{"productId": "nope", "quantity": 1}, {"productId": "p3", "quantity": 5}]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Product nope not found.; Insufficient stock for product p3. Available: 2, Requested: 5."
    );
    assert!(t.repo.is_empty().await);
    assert!(t.publisher.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_catalog_rejection_is_bad_request() {
    let t = test_app_with(
        FixedCatalog { products: vec![], reject_with: Some("Malformed id".to_string()) },
        CapturingPublisher::default(),
    );

    let (status, body) = send(
        &t.router,
        "POST",
        "/orders",
        Some(json!({"userId": "u1", "lines": [{"productId": "??", "quantity": 1}]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid product IDs: Malformed id");
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let t = test_app();

    let (status, _) = send(&t.router, "GET", "/orders/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&t.router, "PUT", "/orders/missing/status", Some(json!({"status": "Shipped"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order with id missing not found");
    assert!(t.publisher.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_status_lifecycle_over_http() {
    let t = test_app();
    let (_, created) = send(
        &t.router,
        "POST",
        "/orders",
        Some(json!({"userId": "u1", "lines": [{"productId": "p1", "quantity": 3}]})),
    )
    .await;
    let order_id = created["orderId"].as_str().unwrap().to_string();
    let status_uri = format!("/orders/{}/status", order_id);

    let (status, body) = send(&t.router, "PUT", &status_uri, Some(json!({"status": "Shipped"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"orderId": order_id, "status": "Shipped"}));

    let (status, _) = send(&t.router, "PUT", &status_uri, Some(json!({"status": "Pending"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&t.router, "PUT", &status_uri, Some(json!({"status": "Misplaced"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, order) = send(&t.router, "GET", &format!("/orders/{}", order_id), None).await;
    assert_eq!(order["status"], "Shipped");
    assert_eq!(order["totalPrice"], 30.0);
    assert_eq!(order["lines"], json!([{"productId": "p1", "quantity": 3}]));

    let events = t.publisher.events.lock().unwrap();
    let keys: Vec<&str> = events.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["order.created", "order.updated"]);
}

#[tokio::test]
async fn test_publish_failure_still_creates_and_is_counted() {
    let t = test_app_with(
        FixedCatalog {
            products: vec![ProductDetails { id: "p1".into(), name: "Product 1".into(), price: dec!(1.25), stock: 10 }],
            reject_with: None,
        },
        CapturingPublisher { fail: true, ..Default::default() },
    );

    let (status, _) = send(
        &t.router,
        "POST",
        "/orders",
        Some(json!({"userId": "u1", "lines": [{"productId": "p1", "quantity": 4}]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(t.repo.len().await, 1);

    let (status, body) = send(&t.router, "GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("order_event_publish_failures_total 1"));
    assert!(text.contains("orders_created_total 1"));
}

#[tokio::test]
async fn test_health() {
    let t = test_app();
    let (status, body) = send(&t.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_store_outage_is_service_unavailable() {
    let publisher = Arc::new(CapturingPublisher::default());
    let metrics = Arc::new(Metrics::new().unwrap());
    let orders = OrderService::new(Arc::new(catalog()), Arc::new(UnreachableStore), publisher.clone());
    let router = app(AppState { orders: Arc::new(orders), metrics });

    let (status, body) = send(
        &router,
        "POST",
        "/orders",
        Some(json!({"userId": "u1", "lines": [{"productId": "p1", "quantity": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "Service Unavailable"}));

    let (status, body) = send(&router, "GET", "/orders/o1", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "Service Unavailable"}));

    assert!(publisher.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_only_rejected_requests_count_as_validation_failures() {
    let t = test_app();

    send(&t.router, "PUT", "/orders/missing/status", Some(json!({"status": "Shipped"}))).await;
    let (_, created) = send(
        &t.router,
        "POST",
        "/orders",
        Some(json!({"userId": "u1", "lines": [{"productId": "p1", "quantity": 1}]})),
    )
    .await;
    let status_uri = format!("/orders/{}/status", created["orderId"].as_str().unwrap());
    send(&t.router, "PUT", &status_uri, Some(json!({"status": "Delivered"}))).await;

    let (_, body) = send(&t.router, "GET", "/metrics", None).await;
    assert!(body.as_str().unwrap().contains("order_validation_failures_total 0"));

    send(
        &t.router,
        "POST",
        "/orders",
        Some(json!({"userId": "u1", "lines": [{"productId": "nope", "quantity": 1}]})),
    )
    .await;
    send(&t.router, "PUT", &status_uri, Some(json!({"status": "Misplaced"}))).await;

    let (_, body) = send(&t.router, "GET", "/metrics", None).await;
    assert!(body.as_str().unwrap().contains("order_validation_failures_total 2"));
}
