//! HTTP implementation of the order service contracts.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{CatalogService, OrderService};
use crate::auth::{AuthSession, Role, SessionRegistry};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::models::{
    ExchangeRequest, ExchangeStatus, LoginRequest, Order, OrderAction, OrderPage, OrderQuery,
    Product, ProductDraft, ProductList,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client for the external order service REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    sessions: SessionRegistry,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    token: String,
    role: Role,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ConsoleError::Config(format!("failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(config.api_base_url.trim_end_matches('/')).map_err(|e| {
            ConsoleError::Config(format!("invalid order service URL '{}': {}", config.api_base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConsoleError::Config(format!(
                "order service URL '{}' cannot carry a path",
                config.api_base_url
            )));
        }

        Ok(Self {
            base_url,
            http,
            sessions: SessionRegistry::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Tokens obtained through [`ApiClient::login`].
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Base URL extended by `segments`, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| matches!(segment.trim(), "" | "." | ".."))
        {
            return Err(ConsoleError::InvalidInput(format!("invalid id '{}'", bad)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConsoleError::Config("order service URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Exchange credentials for an admin session.
    ///
    /// Every issued token is registered with its role. Non-admin accounts
    /// are still refused here even when the service accepts the credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http
            .post(self.endpoint(&["auth", "login"])?)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .json(&request)
            .send()
            .await
            .map_err(|e| ConsoleError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConsoleError::ServiceUnavailable(failure_reason(status, &body)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = message_field(&body)
                .unwrap_or_else(|| format!("Login failed with status: {}", status.as_u16()));
            warn!("Login rejected for {}: {}", email, message);
            return Err(ConsoleError::Unauthorized(message));
        }

        let body: LoginBody = read_json(response).await?;
        let session = AuthSession::new(body.token, body.role);
        self.sessions.register(&session);
        if session.role() != Role::Admin {
            warn!("Login refused for {}: role {}", email, session.role().as_str());
            return Err(ConsoleError::Unauthorized(
                "Access Denied: Not an administrator account.".into(),
            ));
        }

        info!("Admin {} logged in", email);
        Ok(session)
    }

    /// [`ApiClient::send`] with the session's bearer token. A token the
    /// service no longer accepts is dropped from the registry.
    async fn send_as(
        &self,
        session: &AuthSession,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<Response> {
        let result = self
            .send(request.bearer_auth(session.token()), operation)
            .await;
        if let Err(ConsoleError::Unauthorized(_)) = &result {
            if self.sessions.revoke(session.token()) {
                info!("Session dropped after the order service refused it");
            }
        }
        result
    }

    /// Send a request tagged with a fresh request id and map non-2xx
    /// responses onto the error taxonomy.
    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response> {
        let request_id = Uuid::new_v4();
        let response = request
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await
            .map_err(|e| {
                error!("{} failed (request {}): {}", operation, request_id, e);
                ConsoleError::ServiceUnavailable(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("{} succeeded (request {}, {})", operation, request_id, status);
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = error_for_status(status, &body);
        warn!("{} failed (request {}): {}", operation, request_id, err);
        Err(err)
    }
}

/// Map a non-2xx status and body onto a [`ConsoleError`].
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> ConsoleError {
    let reason = failure_reason(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ConsoleError::Unauthorized(reason),
        StatusCode::NOT_FOUND => ConsoleError::NotFound(reason),
        s if s.is_client_error() => ConsoleError::Rejected(reason),
        _ => ConsoleError::ServiceUnavailable(reason),
    }
}

/// The body's `message` field, else the raw body, else the status line.
fn failure_reason(status: StatusCode, body: &str) -> String {
    if let Some(message) = message_field(body) {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.to_string()
    } else {
        trimmed.to_string()
    }
}

fn message_field(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ConsoleError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl OrderService for ApiClient {
    async fn list_orders(&self, session: &AuthSession, query: &OrderQuery) -> Result<OrderPage> {
        let request = self
            .http
            .get(self.endpoint(&["orders", "all"])?)
            .query(&query.to_query_pairs());
        let response = self.send_as(session, request, "list orders").await?;
        read_json(response).await
    }

    async fn get_order(&self, session: &AuthSession, order_id: &str) -> Result<Order> {
        let request = self.http.get(self.endpoint(&["orders", order_id])?);
        let response = self.send_as(session, request, "get order").await?;
        read_json(response).await
    }

    async fn apply_order_action(
        &self,
        session: &AuthSession,
        order_id: &str,
        action: OrderAction,
    ) -> Result<Order> {
        let url = self.endpoint(&["orders", order_id, action.path_segment()])?;
        let response = self
            .send_as(session, self.http.put(url), "order transition")
            .await?;
        read_json(response).await
    }

    async fn update_exchange(
        &self,
        session: &AuthSession,
        exchange_id: &str,
        status: ExchangeStatus,
    ) -> Result<ExchangeRequest> {
        let request = self
            .http
            .put(self.endpoint(&["exchanges", exchange_id])?)
            .json(&json!({ "status": status.as_str() }));
        let response = self.send_as(session, request, "exchange transition").await?;
        read_json(response).await
    }
}

#[async_trait]
impl CatalogService for ApiClient {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let request = self.http.get(self.endpoint(&["products"])?);
        let response = self.send(request, "list products").await?;
        let list: ProductList = read_json(response).await?;
        Ok(list.products)
    }

    async fn get_product(&self, product_id: &str) -> Result<Product> {
        let request = self.http.get(self.endpoint(&["products", product_id])?);
        let response = self.send(request, "get product").await?;
        read_json(response).await
    }

    async fn create_product(&self, session: &AuthSession, draft: &ProductDraft) -> Result<Product> {
        let request = self.http.post(self.endpoint(&["products"])?).json(draft);
        let response = self.send_as(session, request, "create product").await?;
        read_json(response).await
    }

    async fn update_product(
        &self,
        session: &AuthSession,
        product_id: &str,
        draft: &ProductDraft,
    ) -> Result<Product> {
        let request = self
            .http
            .put(self.endpoint(&["products", product_id])?)
            .json(draft);
        let response = self.send_as(session, request, "update product").await?;
        read_json(response).await
    }

    async fn delete_product(&self, session: &AuthSession, product_id: &str) -> Result<()> {
        let request = self.http.delete(self.endpoint(&["products", product_id])?);
        self.send_as(session, request, "delete product").await?;
        Ok(())
    }
}
