//! Product catalog routes.
//!
//! GET    /admin/products      - List products (with total stock)
//! POST   /admin/products      - Create a product
//! GET    /admin/products/{id} - Retrieve a product
//! PUT    /admin/products/{id} - Replace a product
//! DELETE /admin/products/{id} - Delete a product

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Serialize;

use crate::auth::AuthSession;
use crate::error::Result;
use crate::handlers::catalog::ProductCatalog;
use crate::models::{ApiResponse, Product, ProductDraft};

type ProductId = std::result::Result<Path<String>, PathRejection>;
type DraftBody = std::result::Result<Json<ProductDraft>, JsonRejection>;

/// Build the products router.
pub fn router() -> Router {
    Router::new()
        .route("/admin/products", get(list_products).post(create_product))
        .route(
            "/admin/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// A product plus its summed variant stock.
#[derive(Debug, Serialize)]
pub struct ProductSummary {
    #[serde(flatten)]
    pub product: Product,
    pub total_stock: u64,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            total_stock: product.total_stock(),
            product,
        }
    }
}

async fn list_products(
    Extension(catalog): Extension<ProductCatalog>,
) -> Result<Json<ApiResponse<Vec<ProductSummary>>>> {
    let products = catalog.list_products().await?;
    Ok(Json(ApiResponse {
        data: products.into_iter().map(ProductSummary::from).collect(),
        message: "Products retrieved".to_string(),
    }))
}

async fn get_product(
    Extension(catalog): Extension<ProductCatalog>,
    id: ProductId,
) -> Result<Json<ApiResponse<ProductSummary>>> {
    let Path(id) = id?;
    let product = catalog.get_product(&id).await?;
    Ok(Json(ApiResponse {
        data: product.into(),
        message: "Product retrieved".to_string(),
    }))
}

async fn create_product(
    Extension(catalog): Extension<ProductCatalog>,
    session: AuthSession,
    draft: DraftBody,
) -> Result<(StatusCode, Json<ApiResponse<ProductSummary>>)> {
    let Json(draft) = draft?;
    let product = catalog.create_product(&session, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: product.into(),
            message: "Product created successfully".to_string(),
        }),
    ))
}

async fn update_product(
    Extension(catalog): Extension<ProductCatalog>,
    session: AuthSession,
    id: ProductId,
    draft: DraftBody,
) -> Result<Json<ApiResponse<ProductSummary>>> {
    let Path(id) = id?;
    let Json(draft) = draft?;
    let product = catalog.update_product(&session, &id, draft).await?;
    Ok(Json(ApiResponse {
        data: product.into(),
        message: "Product updated".to_string(),
    }))
}

async fn delete_product(
    Extension(catalog): Extension<ProductCatalog>,
    session: AuthSession,
    id: ProductId,
) -> Result<StatusCode> {
    let Path(id) = id?;
    catalog.delete_product(&session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
