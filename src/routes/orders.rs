//! Order lifecycle routes.
//!
//! GET  /admin/orders               - List orders (page, startDate, endDate, status, search)
//! GET  /admin/orders/{id}          - Order detail with label, offered actions and flags
//! POST /admin/orders/{id}/pay      - Mark the order paid
//! POST /admin/orders/{id}/deliver  - Mark the order delivered
//! PUT  /admin/orders/{id}/exchange - Move the attached exchange request to a new status
//!
//! Every transition validates against a freshly fetched snapshot and answers
//! with a refetched view, never with a locally patched copy.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use tracing::info;

use crate::auth::AuthSession;
use crate::error::{ConsoleError, Result};
use crate::handlers::lifecycle::OrderLifecycleManager;
use crate::models::{
    ApiResponse, DateRange, ExchangeStatus, ExchangeTransitionRequest, ListOrdersParams,
    OrderAction, OrderFilters, OrderListView, OrderStatus, OrderView, UnknownStatus,
};

type OrderId = std::result::Result<Path<String>, PathRejection>;

/// Build the orders router.
pub fn router() -> Router {
    Router::new()
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/{id}", get(get_order))
        .route("/admin/orders/{id}/pay", post(mark_paid))
        .route("/admin/orders/{id}/deliver", post(mark_delivered))
        .route("/admin/orders/{id}/exchange", put(transition_exchange))
}

impl TryFrom<ListOrdersParams> for OrderFilters {
    type Error = ConsoleError;

    fn try_from(params: ListOrdersParams) -> Result<Self> {
        let status = params
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<OrderStatus>()
                    .map_err(|e| ConsoleError::InvalidFilter(e.to_string()))
            })
            .transpose()?;

        let date_range = if params.start_date.is_some() || params.end_date.is_some() {
            Some(DateRange {
                start: params.start_date,
                end: params.end_date,
            })
        } else {
            None
        };

        Ok(OrderFilters {
            page: params.page.unwrap_or(1),
            date_range,
            status,
            search_term: params.search,
        })
    }
}

async fn list_orders(
    Extension(lifecycle): Extension<OrderLifecycleManager>,
    session: AuthSession,
    params: std::result::Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<ApiResponse<OrderListView>>> {
    let Query(params) = params?;
    let filters = OrderFilters::try_from(params)?;
    let page = lifecycle.list_orders(&session, &filters).await?;

    let view = OrderListView {
        orders: page.orders.into_iter().map(OrderLifecycleManager::view).collect(),
        page: page.page,
        pages: page.pages,
    };
    Ok(Json(ApiResponse {
        data: view,
        message: "Orders retrieved".to_string(),
    }))
}

async fn get_order(
    Extension(lifecycle): Extension<OrderLifecycleManager>,
    session: AuthSession,
    id: OrderId,
) -> Result<Json<ApiResponse<OrderView>>> {
    let Path(id) = id?;
    let order = lifecycle.get_order(&session, &id).await?;
    Ok(Json(ApiResponse {
        data: OrderLifecycleManager::view(order),
        message: "Order retrieved".to_string(),
    }))
}

async fn mark_paid(
    Extension(lifecycle): Extension<OrderLifecycleManager>,
    session: AuthSession,
    id: OrderId,
) -> Result<Json<ApiResponse<OrderView>>> {
    let Path(id) = id?;
    apply_order_action(&lifecycle, &session, &id, OrderAction::MarkPaid).await
}

async fn mark_delivered(
    Extension(lifecycle): Extension<OrderLifecycleManager>,
    session: AuthSession,
    id: OrderId,
) -> Result<Json<ApiResponse<OrderView>>> {
    let Path(id) = id?;
    apply_order_action(&lifecycle, &session, &id, OrderAction::MarkDelivered).await
}

async fn apply_order_action(
    lifecycle: &OrderLifecycleManager,
    session: &AuthSession,
    id: &str,
    action: OrderAction,
) -> Result<Json<ApiResponse<OrderView>>> {
    let snapshot = lifecycle.get_order(session, id).await?;
    lifecycle
        .request_order_transition(session, &snapshot, action)
        .await?;

    let refreshed = lifecycle.get_order(session, id).await?;
    info!("Order {} refreshed after {}", id, action);
    Ok(Json(ApiResponse {
        data: OrderLifecycleManager::view(refreshed),
        message: format!("Order updated: {}", action),
    }))
}

async fn transition_exchange(
    Extension(lifecycle): Extension<OrderLifecycleManager>,
    session: AuthSession,
    id: OrderId,
    req: std::result::Result<Json<ExchangeTransitionRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<OrderView>>> {
    session.require_admin()?;
    let Path(id) = id?;
    let Json(req) = req?;
    let target: ExchangeStatus = req
        .status
        .parse()
        .map_err(|e: UnknownStatus| ConsoleError::InvalidInput(e.to_string()))?;

    let snapshot = lifecycle.get_order(&session, &id).await?;
    let exchange = snapshot
        .exchange_request
        .as_ref()
        .ok_or_else(|| ConsoleError::NotFound(format!("order {} has no exchange request", id)))?;
    lifecycle
        .request_exchange_transition(&session, exchange, target)
        .await?;

    let refreshed = lifecycle.get_order(&session, &id).await?;
    Ok(Json(ApiResponse {
        data: OrderLifecycleManager::view(refreshed),
        message: format!("Exchange updated: {}", target),
    }))
}
