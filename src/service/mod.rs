//! Contracts for the external order service.
//!
//! The lifecycle manager and product catalog only talk to these traits;
//! [`ApiClient`] implements them over HTTP. Tests substitute in-memory
//! fakes.

mod http;

pub use http::ApiClient;

use async_trait::async_trait;

use crate::auth::AuthSession;
use crate::error::Result;
use crate::models::{
    ExchangeRequest, ExchangeStatus, Order, OrderAction, OrderPage, OrderQuery, Product,
    ProductDraft,
};

/// Source of truth for order and exchange documents.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// `GET /orders/all`
    async fn list_orders(&self, session: &AuthSession, query: &OrderQuery) -> Result<OrderPage>;

    /// `GET /orders/{id}`
    async fn get_order(&self, session: &AuthSession, order_id: &str) -> Result<Order>;

    /// `PUT /orders/{id}/pay` or `PUT /orders/{id}/deliver`
    async fn apply_order_action(
        &self,
        session: &AuthSession,
        order_id: &str,
        action: OrderAction,
    ) -> Result<Order>;

    /// `PUT /exchanges/{id}`
    async fn update_exchange(
        &self,
        session: &AuthSession,
        exchange_id: &str,
        status: ExchangeStatus,
    ) -> Result<ExchangeRequest>;
}

/// Product catalog endpoints of the same service.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>>;

    async fn get_product(&self, product_id: &str) -> Result<Product>;

    async fn create_product(&self, session: &AuthSession, draft: &ProductDraft) -> Result<Product>;

    async fn update_product(
        &self,
        session: &AuthSession,
        product_id: &str,
        draft: &ProductDraft,
    ) -> Result<Product>;

    async fn delete_product(&self, session: &AuthSession, product_id: &str) -> Result<()>;
}
