//! Shopcore - relational storage core for an e-commerce catalog.
//!
//! Seven entities (users, categories, products, carts, cart items, orders,
//! order items) persisted in PostgreSQL, exposed as per-entity repositories
//! plus read-side aggregate joins. Partial updates are built through an
//! allow-listed, parameterized `SET` clause builder; merge-semantics writes
//! (cart-item add-or-increment, bulk order-item insert with duplicate
//! suppression) run as single atomic statements. All failures surface as
//! typed [`error::StoreError`] values; HTTP semantics belong to the caller.

pub mod auth;
pub mod config;
pub mod error;
pub mod fields;
pub mod models;
pub mod repository;
pub mod schema;

pub use error::{ErrorKind, Result, StoreError};
pub use fields::{build_set_clause, FieldUpdates, SetClause, SqlValue};
pub use repository::Store;
