//! # Order Lifecycle
//!
//! Status classification and transition validation for orders and their
//! exchange requests.
//!
//! ## Order transitions
//!
//! - **MarkPaid**: only while `isPaid = false`
//! - **MarkDelivered**: only while status is not `Delivered` or `Cancelled`
//!
//! ## Exchange transitions
//!
//! | current   | allowed targets    |
//! |-----------|--------------------|
//! | Pending   | Approved, Rejected |
//! | Approved  | Completed          |
//! | Rejected  | (terminal)         |
//! | Completed | (terminal)         |
//!
//! Every check runs against the snapshot the caller already holds, so an
//! illegal request fails before any call to the order service. The service
//! stays the enforcing authority; callers refetch after a transition instead
//! of trusting a local copy.

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::AuthSession;
use crate::error::{ConsoleError, Result};
use crate::models::{
    ExchangeRequest, ExchangeStatus, Order, OrderAction, OrderFilters, OrderPage, OrderQuery,
    OrderStatus, OrderView, StatusDisagreement, StatusLabel,
};
use crate::service::OrderService;

/// Validates and submits staff-triggered order and exchange transitions.
#[derive(Clone)]
pub struct OrderLifecycleManager {
    service: Arc<dyn OrderService>,
}

impl OrderLifecycleManager {
    pub fn new(service: Arc<dyn OrderService>) -> Self {
        Self { service }
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// Display label for an order.
    ///
    /// An exchange request with a status takes precedence over the order's
    /// own status. Without one, the order status is used, defaulting to
    /// `Processing` when missing.
    pub fn classify_status(order: &Order) -> StatusLabel {
        if let Some(status) = order.exchange_request.as_ref().and_then(|ex| ex.status) {
            return StatusLabel::Exchange(status);
        }
        StatusLabel::Order(order.status.unwrap_or(OrderStatus::Processing))
    }

    /// Order actions a UI may offer for this snapshot.
    pub fn available_actions(order: &Order) -> Vec<OrderAction> {
        [OrderAction::MarkDelivered, OrderAction::MarkPaid]
            .into_iter()
            .filter(|action| Self::check_order_action(order, *action).is_ok())
            .collect()
    }

    /// Exchange targets a UI may offer for this snapshot.
    pub fn available_exchange_targets(order: &Order) -> Vec<ExchangeStatus> {
        order
            .exchange_request
            .as_ref()
            .and_then(|ex| ex.status)
            .map(|status| status.allowed_targets().to_vec())
            .unwrap_or_default()
    }

    /// Disagreements between `status` and the legacy flags.
    pub fn detect_disagreements(order: &Order) -> Vec<StatusDisagreement> {
        let mut found = Vec::new();

        let status_delivered = order.status == Some(OrderStatus::Delivered);
        if status_delivered != order.is_delivered {
            found.push(StatusDisagreement::DeliveredFlagMismatch {
                status: order.status,
                is_delivered: order.is_delivered,
            });
        }

        let cancelled = order.status == Some(OrderStatus::Cancelled);
        match (cancelled, order.cancelled_at.is_some()) {
            (true, false) => found.push(StatusDisagreement::CancelledWithoutTimestamp),
            (false, true) => found.push(StatusDisagreement::CancellationTimestampOnActiveOrder {
                status: order.status,
            }),
            _ => {}
        }

        found
    }

    /// Snapshot plus everything derived from it for display.
    pub fn view(order: Order) -> OrderView {
        OrderView {
            label: Self::classify_status(&order),
            items_subtotal: order.items_subtotal(),
            actions: Self::available_actions(&order),
            exchange_actions: Self::available_exchange_targets(&order),
            disagreements: Self::detect_disagreements(&order),
            order,
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// List one page of orders. Filtering happens on the order service.
    pub async fn list_orders(
        &self,
        session: &AuthSession,
        filters: &OrderFilters,
    ) -> Result<OrderPage> {
        session.require_admin()?;
        let query = validate_filters(filters)?;
        let page = self.service.list_orders(session, &query).await?;
        for order in &page.orders {
            flag_disagreements(order);
        }
        Ok(page)
    }

    pub async fn get_order(&self, session: &AuthSession, order_id: &str) -> Result<Order> {
        session.require_admin()?;
        if order_id.trim().is_empty() {
            return Err(ConsoleError::NotFound("empty order id".into()));
        }
        let order = self.service.get_order(session, order_id).await?;
        flag_disagreements(&order);
        Ok(order)
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Submit `action` for the order in `snapshot`.
    ///
    /// Returns the service's echo of the order; refetch before display.
    pub async fn request_order_transition(
        &self,
        session: &AuthSession,
        snapshot: &Order,
        action: OrderAction,
    ) -> Result<Order> {
        session.require_admin()?;
        Self::check_order_action(snapshot, action)?;

        let updated = self
            .service
            .apply_order_action(session, &snapshot.id, action)
            .await?;
        info!("Order {}: {} accepted", snapshot.id, action);
        Ok(updated)
    }

    /// Move the exchange in `snapshot` to `target`.
    pub async fn request_exchange_transition(
        &self,
        session: &AuthSession,
        snapshot: &ExchangeRequest,
        target: ExchangeStatus,
    ) -> Result<ExchangeRequest> {
        session.require_admin()?;

        let current = snapshot.status.ok_or_else(|| {
            ConsoleError::invalid_transition("exchange", "<missing status>", target)
        })?;
        if !current.can_transition_to(target) {
            return Err(ConsoleError::invalid_transition("exchange", current, target));
        }

        let updated = self
            .service
            .update_exchange(session, &snapshot.id, target)
            .await?;
        info!("Exchange {}: {} -> {} accepted", snapshot.id, current, target);
        Ok(updated)
    }

    fn check_order_action(order: &Order, action: OrderAction) -> Result<()> {
        let status = order.status.unwrap_or(OrderStatus::Processing);
        match action {
            OrderAction::MarkDelivered if status.is_terminal() => {
                Err(ConsoleError::invalid_transition("order", status, action))
            }
            OrderAction::MarkPaid if order.is_paid => {
                Err(ConsoleError::invalid_transition("order", "paid", action))
            }
            _ => Ok(()),
        }
    }
}

/// Check filters locally and turn them into an upstream query.
pub fn validate_filters(filters: &OrderFilters) -> Result<OrderQuery> {
    if filters.page < 1 {
        return Err(ConsoleError::InvalidFilter("page must be at least 1".into()));
    }

    let (start, end) = match &filters.date_range {
        None => (None, None),
        Some(range) => match (range.start, range.end) {
            (Some(start), Some(end)) if start <= end => (Some(start), Some(end)),
            (Some(start), Some(end)) => {
                return Err(ConsoleError::InvalidFilter(format!(
                    "date range starts after it ends ({} > {})",
                    start, end
                )))
            }
            _ => {
                return Err(ConsoleError::InvalidFilter(
                    "date range needs both a start and an end date".into(),
                ))
            }
        },
    };

    let search = filters
        .search_term
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string);

    Ok(OrderQuery {
        page: filters.page,
        start,
        end,
        status: filters.status,
        search,
    })
}

fn flag_disagreements(order: &Order) {
    for disagreement in OrderLifecycleManager::detect_disagreements(order) {
        warn!("Order {}: {}", order.id, disagreement);
    }
}
