//! Console business logic, independent of HTTP routing.
//!
//! - `lifecycle`: order and exchange status classification and transitions
//! - `catalog`: product draft validation and catalog writes
//!
//! Both talk to the order service only through the traits in `service`.

pub mod catalog;
pub mod lifecycle;
