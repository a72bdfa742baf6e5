//! In-process mock of the external order service.
//!
//! Each test spawns its own instance on `127.0.0.1:0`, so state never leaks
//! between tests. Every request is recorded for later assertions.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use order_console::config::ConsoleConfig;
use order_console::service::ApiClient;

pub const ADMIN_TOKEN: &str = "admin-token";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct MockState {
    pub orders: BTreeMap<String, Value>,
    pub products: BTreeMap<String, Value>,
    pub calls: Vec<RecordedCall>,
    /// When set, the admin token is refused as if it had expired.
    pub tokens_expired: bool,
    next_product: u32,
}

type Shared = Arc<Mutex<MockState>>;
type Reply = (StatusCode, Json<Value>);

pub struct MockUpstream {
    pub base_url: String,
    pub state: Shared,
}

impl MockUpstream {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than plain reads.
    pub fn writes(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.method != Method::GET)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn expire_tokens(&self) {
        self.state.lock().unwrap().tokens_expired = true;
    }

    pub fn client(&self) -> ApiClient {
        let config = ConsoleConfig {
            api_base_url: self.base_url.clone(),
            ..ConsoleConfig::default()
        };
        ApiClient::new(&config).expect("client builds")
    }
}

fn seed() -> MockState {
    let mut state = MockState::default();
    let orders = [
        json!({
            "_id": "ord-1",
            "status": "Processing",
            "isPaid": false,
            "isDelivered": false,
            "createdAt": "2024-01-05T09:30:00.000Z",
            "user": {"_id": "u1", "name": "Asha Rao", "email": "asha@example.com"},
            "shippingAddress": {"fullName": "Asha Rao", "address": "12 MG Road", "city": "Pune",
                                "state": "MH", "postalCode": "411001", "phone": "9999999999"},
            "orderItems": [{"name": "Linen Kurta", "qty": 1, "price": 1299.0, "size": "M"}],
            "paymentMethod": "COD",
            "itemsPrice": 1299.0, "taxPrice": 0.0, "shippingPrice": 50.0, "totalPrice": 1349.0
        }),
        json!({
            "_id": "ord-2",
            "status": "Delivered",
            "isPaid": true,
            "isDelivered": true,
            "createdAt": "2024-01-06T09:30:00.000Z",
            "totalPrice": 899.0,
            "exchangeRequest": {"_id": "ex-2", "status": "Pending", "reason": "Wrong size",
                                "imageUrls": ["https://res.cloudinary.com/ex2.jpg"],
                                "createdAt": "2024-01-10T12:00:00.000Z"}
        }),
        json!({
            "_id": "ord-3",
            "status": "Shipped",
            "isPaid": true,
            "isDelivered": false,
            "createdAt": "2024-01-07T09:30:00.000Z",
            "exchangeRequest": {"_id": "ex-3", "status": "Approved", "reason": "Colour mismatch"}
        }),
        json!({
            "_id": "ord-4",
            "status": "Cancelled",
            "isPaid": false,
            "isDelivered": false,
            "createdAt": "2024-01-08T09:30:00.000Z",
            "cancelledAt": "2024-01-09T09:30:00.000Z",
            "cancellationReason": {"reason": "Ordered by mistake"}
        }),
        json!({
            "_id": "ord-5",
            "status": "Processing",
            "isPaid": true,
            "isDelivered": true,
            "createdAt": "2024-01-09T09:30:00.000Z"
        }),
        json!({
            "_id": "ord-down",
            "status": "Processing",
            "isPaid": false,
            "createdAt": "2024-01-09T09:30:00.000Z"
        }),
        json!({
            "_id": "ord-reject",
            "status": "Processing",
            "isPaid": false,
            "createdAt": "2024-01-09T09:30:00.000Z"
        }),
        json!({
            "_id": "bad-1",
            "status": "Lost",
            "createdAt": "2024-01-09T09:30:00.000Z"
        }),
    ];
    for order in orders {
        let id = order["_id"].as_str().unwrap().to_string();
        state.orders.insert(id, order);
    }

    state.products.insert(
        "prod-1".into(),
        json!({
            "_id": "prod-1",
            "name": "Linen Kurta",
            "description": "Breathable",
            "category": "IT girl",
            "price": 1299.0,
            "variants": [{"size": "S", "stock": 3}, {"size": "M", "stock": 5}],
            "images": ["https://res.cloudinary.com/kurta.jpg"],
            "isNewArrival": true,
            "isSuggested": false,
            "suggestedItems": []
        }),
    );
    state.next_product = 2;
    state
}

fn record(state: &Shared, method: Method, uri: &Uri, headers: &HeaderMap, body: Option<Value>) {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    state.lock().unwrap().calls.push(RecordedCall {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        bearer,
        body,
    });
}

fn require_admin(state: &Shared, headers: &HeaderMap) -> Result<(), Reply> {
    let expected = format!("Bearer {}", ADMIN_TOKEN);
    let expired = state.lock().unwrap().tokens_expired;
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected && !expired => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Not authorized, token failed"})),
        )),
    }
}

fn not_found(what: &str) -> Reply {
    (StatusCode::NOT_FOUND, Json(json!({"message": format!("{} not found", what)})))
}

async fn upstream_login(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    record(&state, method, &uri, &headers, Some(body.clone()));
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("admin@shop.test"), Some("secret")) => (
            StatusCode::OK,
            Json(json!({"_id": "u-admin", "token": ADMIN_TOKEN, "role": "admin"})),
        ),
        (Some("user@shop.test"), Some("secret")) => (
            StatusCode::OK,
            Json(json!({"_id": "u-user", "token": "user-token", "role": "user"})),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid email or password"})),
        ),
    }
}

async fn list_orders(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    record(&state, method, &uri, &headers, None);
    require_admin(&state, &headers)?;
    let page: u32 = uri
        .query()
        .unwrap_or("")
        .split('&')
        .find_map(|pair| pair.strip_prefix("pageNumber="))
        .and_then(|n| n.parse().ok())
        .unwrap_or(1);
    let guard = state.lock().unwrap();
    let orders: Vec<Value> = guard
        .orders
        .iter()
        .filter(|(id, _)| !id.starts_with("bad-"))
        .map(|(_, order)| order.clone())
        .collect();
    Ok(Json(json!({"orders": orders, "page": page, "pages": 1})))
}

async fn get_order(
    State(state): State<Shared>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    record(&state, method, &uri, &headers, None);
    require_admin(&state, &headers)?;
    let guard = state.lock().unwrap();
    guard
        .orders
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Order"))
}

async fn pay_order(
    State(state): State<Shared>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    record(&state, method, &uri, &headers, None);
    require_admin(&state, &headers)?;
    match id.as_str() {
        "ord-down" => {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"message": "Payments under maintenance"})),
            ))
        }
        "ord-reject" => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "Payment not captured"})),
            ))
        }
        _ => {}
    }
    let mut guard = state.lock().unwrap();
    let order = guard.orders.get_mut(&id).ok_or_else(|| not_found("Order"))?;
    order["isPaid"] = json!(true);
    order["paidAt"] = json!("2024-02-01T10:00:00.000Z");
    Ok(Json(order.clone()))
}

async fn deliver_order(
    State(state): State<Shared>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    record(&state, method, &uri, &headers, None);
    require_admin(&state, &headers)?;
    let mut guard = state.lock().unwrap();
    let order = guard.orders.get_mut(&id).ok_or_else(|| not_found("Order"))?;
    order["status"] = json!("Delivered");
    order["isDelivered"] = json!(true);
    order["deliveredAt"] = json!("2024-02-02T10:00:00.000Z");
    Ok(Json(order.clone()))
}

async fn update_exchange(
    State(state): State<Shared>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Reply> {
    record(&state, method, &uri, &headers, Some(body.clone()));
    require_admin(&state, &headers)?;
    let mut guard = state.lock().unwrap();
    let exchange = guard
        .orders
        .values_mut()
        .filter_map(|order| order.get_mut("exchangeRequest"))
        .find(|exchange| exchange["_id"].as_str() == Some(id.as_str()))
        .ok_or_else(|| not_found("Exchange request"))?;
    exchange["status"] = body["status"].clone();
    Ok(Json(exchange.clone()))
}

async fn list_products(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Json<Value> {
    record(&state, method, &uri, &headers, None);
    let guard = state.lock().unwrap();
    let products: Vec<Value> = guard.products.values().cloned().collect();
    Json(json!({ "products": products }))
}

fn product_from_draft(id: &str, draft: &Value) -> Value {
    json!({
        "_id": id,
        "name": draft["productName"],
        "description": draft["description"],
        "category": draft["category"],
        "price": draft["regularPrice"],
        "variants": draft["variants"],
        "images": draft["images"],
        "isNewArrival": draft["isNewArrival"],
        "isSuggested": draft["isSuggested"],
        "suggestedItems": draft["suggestedItems"]
    })
}

async fn create_product(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), Reply> {
    record(&state, method, &uri, &headers, Some(body.clone()));
    require_admin(&state, &headers)?;
    let mut guard = state.lock().unwrap();
    let id = format!("prod-{}", guard.next_product);
    guard.next_product += 1;
    let product = product_from_draft(&id, &body);
    guard.products.insert(id, product.clone());
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    record(&state, method, &uri, &headers, None);
    let guard = state.lock().unwrap();
    guard
        .products
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found("Product"))
}

async fn update_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Reply> {
    record(&state, method, &uri, &headers, Some(body.clone()));
    require_admin(&state, &headers)?;
    let mut guard = state.lock().unwrap();
    if !guard.products.contains_key(&id) {
        return Err(not_found("Product"));
    }
    let product = product_from_draft(&id, &body);
    guard.products.insert(id, product.clone());
    Ok(Json(product))
}

async fn delete_product(
    State(state): State<Shared>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, Reply> {
    record(&state, method, &uri, &headers, None);
    require_admin(&state, &headers)?;
    let mut guard = state.lock().unwrap();
    guard
        .products
        .remove(&id)
        .map(|_| Json(json!({"message": "Product removed"})))
        .ok_or_else(|| not_found("Product"))
}

/// Spawn the mock order service and return its base URL.
pub async fn spawn_upstream() -> MockUpstream {
    let state: Shared = Arc::new(Mutex::new(seed()));
    let app = Router::new()
        .route("/auth/login", post(upstream_login))
        .route("/orders/all", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/pay", put(pay_order))
        .route("/orders/{id}/deliver", put(deliver_order))
        .route("/exchanges/{id}", put(update_exchange))
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("mock upstream address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock upstream serves");
    });

    MockUpstream {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Spawn the console itself in front of `upstream` and return its base URL.
pub async fn spawn_console(upstream: &MockUpstream) -> String {
    let app = order_console::create_app(order_console::ConsoleState::new(upstream.client()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind console");
    let addr = listener.local_addr().expect("console address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("console serves");
    });
    format!("http://{}", addr)
}

/// Log in through the console and return the response status. The login
/// call is cleared from the upstream record.
pub async fn login(console: &str, upstream: &MockUpstream, email: &str) -> reqwest::StatusCode {
    let res = reqwest::Client::new()
        .post(format!("{}/admin/login", console))
        .json(&json!({"email": email, "password": "secret"}))
        .send()
        .await
        .expect("Failed to send request");
    upstream.clear_calls();
    res.status()
}

/// Log in as the seeded admin and return the bearer token.
pub async fn login_admin(console: &str, upstream: &MockUpstream) -> String {
    let status = login(console, upstream, "admin@shop.test").await;
    assert_eq!(status, 200, "admin login");
    ADMIN_TOKEN.to_string()
}
