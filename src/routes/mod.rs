//! HTTP route modules for the admin console.
//!
//! - `auth`: admin login against the order service
//! - `orders`: order listing, detail views, and pay/deliver/exchange transitions
//! - `products`: product catalog browsing and edits

pub mod auth;
pub mod orders;
pub mod products;
