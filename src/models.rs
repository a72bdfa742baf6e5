//! Domain models for the order console.
//!
//! These structs mirror the JSON documents served by the external order
//! service. Status fields are closed enumerations: an unrecognized status
//! string fails deserialization at the boundary instead of leaking into the
//! lifecycle logic.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Status Vocabulary
// ============================================================================

/// Primary fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status string that is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Status of a customer exchange request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl ExchangeStatus {
    pub const ALL: [ExchangeStatus; 4] = [
        ExchangeStatus::Pending,
        ExchangeStatus::Approved,
        ExchangeStatus::Rejected,
        ExchangeStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "Pending",
            ExchangeStatus::Approved => "Approved",
            ExchangeStatus::Rejected => "Rejected",
            ExchangeStatus::Completed => "Completed",
        }
    }

    /// Targets reachable from this status. `Pending` is never a target.
    pub fn allowed_targets(&self) -> &'static [ExchangeStatus] {
        match self {
            ExchangeStatus::Pending => &[ExchangeStatus::Approved, ExchangeStatus::Rejected],
            ExchangeStatus::Approved => &[ExchangeStatus::Completed],
            ExchangeStatus::Rejected | ExchangeStatus::Completed => &[],
        }
    }

    pub fn can_transition_to(&self, target: ExchangeStatus) -> bool {
        self.allowed_targets().contains(&target)
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExchangeStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Display label for an order, after applying exchange precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusLabel {
    Order(OrderStatus),
    Exchange(ExchangeStatus),
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLabel::Order(status) => write!(f, "{}", status),
            StatusLabel::Exchange(status) => write!(f, "Exchange {}", status),
        }
    }
}

impl Serialize for StatusLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Staff-triggered order transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderAction {
    MarkPaid,
    MarkDelivered,
}

impl OrderAction {
    /// Path segment on the order service (`/orders/{id}/{segment}`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            OrderAction::MarkPaid => "pay",
            OrderAction::MarkDelivered => "deliver",
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::MarkPaid => f.write_str("mark paid"),
            OrderAction::MarkDelivered => f.write_str("mark delivered"),
        }
    }
}

// ============================================================================
// Order Documents
// ============================================================================

/// A customer order as served by the order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename(deserialize = "_id"), alias = "id")]
    pub id: String,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub is_delivered: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancellation_reason: Option<CancellationReason>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub user: Option<OrderUser>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_result: Option<serde_json::Value>,
    #[serde(default)]
    pub items_price: f64,
    #[serde(default)]
    pub tax_price: f64,
    #[serde(default)]
    pub shipping_price: f64,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub exchange_request: Option<ExchangeRequest>,
}

impl Order {
    /// Sum of line items, independent of the server-side `itemsPrice`.
    pub fn items_subtotal(&self) -> f64 {
        self.order_items
            .iter()
            .map(|item| item.price * item.qty as f64)
            .sum()
    }
}

/// A customer-initiated exchange layered on an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    #[serde(rename(deserialize = "_id"), alias = "id")]
    pub id: String,
    #[serde(default)]
    pub status: Option<ExchangeStatus>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationReason {
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Shipping address for an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUser {
    #[serde(rename(deserialize = "_id"), alias = "id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A single line item in an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
}

/// One page of orders as returned by `GET /orders/all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: u32,
    pub pages: u32,
}

/// Observed inconsistency between `status` and the legacy boolean flags.
///
/// Flagged, never resolved: `status` stays primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusDisagreement {
    DeliveredFlagMismatch {
        status: Option<OrderStatus>,
        is_delivered: bool,
    },
    CancelledWithoutTimestamp,
    CancellationTimestampOnActiveOrder { status: Option<OrderStatus> },
}

impl fmt::Display for StatusDisagreement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusDisagreement::DeliveredFlagMismatch { status, is_delivered } => write!(
                f,
                "status {} disagrees with isDelivered={}",
                status.map(|s| s.as_str()).unwrap_or("<missing>"),
                is_delivered
            ),
            StatusDisagreement::CancelledWithoutTimestamp => {
                f.write_str("cancelled order has no cancelledAt")
            }
            StatusDisagreement::CancellationTimestampOnActiveOrder { status } => write!(
                f,
                "cancelledAt set on order with status {}",
                status.map(|s| s.as_str()).unwrap_or("<missing>")
            ),
        }
    }
}

// ============================================================================
// Order Filters
// ============================================================================

/// Date range filter. Both ends are required once a range is given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Filters for listing orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilters {
    pub page: u32,
    pub date_range: Option<DateRange>,
    pub status: Option<OrderStatus>,
    pub search_term: Option<String>,
}

impl OrderFilters {
    pub fn page(page: u32) -> Self {
        Self {
            page,
            date_range: None,
            status: None,
            search_term: None,
        }
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_range = Some(DateRange { start, end });
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }
}

/// Filters that passed local validation and are ready to send upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub page: u32,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
}

impl OrderQuery {
    /// Query string pairs for `GET /orders/all`.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("pageNumber", self.page.to_string())];
        if let (Some(start), Some(end)) = (self.start, self.end) {
            pairs.push(("startDate", midnight_utc(start)));
            pairs.push(("endDate", midnight_utc(end)));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

fn midnight_utc(date: NaiveDate) -> String {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

// ============================================================================
// Product Catalog
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub size: String,
    pub stock: u32,
}

/// A catalog product as served by the order service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename(deserialize = "_id"), alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_new_arrival: bool,
    #[serde(default)]
    pub is_suggested: bool,
    #[serde(default)]
    pub suggested_items: Vec<String>,
}

impl Product {
    pub fn total_stock(&self) -> u64 {
        self.variants.iter().map(|v| u64::from(v.stock)).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductList {
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Body for creating or updating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub product_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub regular_price: f64,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_new_arrival: bool,
    #[serde(default)]
    pub is_suggested: bool,
    #[serde(default)]
    pub suggested_items: Vec<String>,
}

// ============================================================================
// Request Models
// ============================================================================

/// Request body for the admin login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Query parameters accepted by `GET /admin/orders`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersParams {
    pub page: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Request body for an exchange transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeTransitionRequest {
    pub status: String,
}

// ============================================================================
// Response Models
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub message: String,
}

/// Response for a successful admin login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
}

/// An order with its derived display state.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub order: Order,
    pub label: StatusLabel,
    /// Sum of the line items, shown beside the service's `itemsPrice`.
    pub items_subtotal: f64,
    pub actions: Vec<OrderAction>,
    pub exchange_actions: Vec<ExchangeStatus>,
    pub disagreements: Vec<StatusDisagreement>,
}

/// A page of order views.
#[derive(Debug, Serialize)]
pub struct OrderListView {
    pub orders: Vec<OrderView>,
    pub page: u32,
    pub pages: u32,
}
