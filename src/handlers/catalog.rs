//! # Product Catalog
//!
//! Reads are public; create, update and delete need an admin session and a
//! draft that passes local validation. Stock and pricing authority stay with
//! the order service.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::auth::AuthSession;
use crate::error::{ConsoleError, Result};
use crate::models::{Product, ProductDraft};
use crate::service::CatalogService;

#[derive(Clone)]
pub struct ProductCatalog {
    service: Arc<dyn CatalogService>,
}

impl ProductCatalog {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        Self { service }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.service.list_products().await
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product> {
        self.service.get_product(product_id).await
    }

    pub async fn create_product(&self, session: &AuthSession, draft: ProductDraft) -> Result<Product> {
        session.require_admin()?;
        let draft = normalize_draft(draft)?;
        let product = self.service.create_product(session, &draft).await?;
        info!("Product {} created ({})", product.id, product.name);
        Ok(product)
    }

    pub async fn update_product(
        &self,
        session: &AuthSession,
        product_id: &str,
        draft: ProductDraft,
    ) -> Result<Product> {
        session.require_admin()?;
        let draft = normalize_draft(draft)?;
        let product = self.service.update_product(session, product_id, &draft).await?;
        info!("Product {} updated", product_id);
        Ok(product)
    }

    pub async fn delete_product(&self, session: &AuthSession, product_id: &str) -> Result<()> {
        session.require_admin()?;
        self.service.delete_product(session, product_id).await?;
        info!("Product {} deleted", product_id);
        Ok(())
    }
}

/// Strip blank image URLs and trim names, then validate.
pub fn normalize_draft(mut draft: ProductDraft) -> Result<ProductDraft> {
    draft.product_name = draft.product_name.trim().to_string();
    draft.images.retain(|url| !url.trim().is_empty());
    for variant in &mut draft.variants {
        variant.size = variant.size.trim().to_string();
    }

    if draft.product_name.is_empty() {
        return Err(ConsoleError::InvalidInput("product name is required".into()));
    }
    if !draft.regular_price.is_finite() || draft.regular_price <= 0.0 {
        return Err(ConsoleError::InvalidInput(format!(
            "price must be positive, got {}",
            draft.regular_price
        )));
    }
    if draft.variants.is_empty() {
        return Err(ConsoleError::InvalidInput("at least one variant is required".into()));
    }
    let mut sizes = HashSet::new();
    for variant in &draft.variants {
        if variant.size.is_empty() {
            return Err(ConsoleError::InvalidInput("variant size is required".into()));
        }
        if !sizes.insert(variant.size.clone()) {
            return Err(ConsoleError::InvalidInput(format!(
                "duplicate variant size '{}'",
                variant.size
            )));
        }
    }
    if draft.images.is_empty() {
        return Err(ConsoleError::InvalidInput("at least one image URL is required".into()));
    }

    Ok(draft)
}
