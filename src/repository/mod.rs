//! Per-entity repositories over PostgreSQL.
//!
//! Each repository owns all reads and writes for one table. Repositories
//! are stateless handles over a shared pool; the store is the sole point of
//! concurrency control, and every operation maps to a single SQL statement
//! (the paired user+cart create runs in one transaction).

mod aggregates;
mod cart_items;
mod carts;
mod categories;
mod order_items;
mod orders;
mod products;
mod users;

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{Argon2Hasher, CredentialHasher};
use crate::error::Result;
use crate::models::{CartWithItems, CategoryWithProducts, OrderWithItems};

pub use cart_items::CartItemRepo;
pub use carts::CartRepo;
pub use categories::CategoryRepo;
pub use order_items::OrderItemRepo;
pub use orders::OrderRepo;
pub use products::ProductRepo;
pub use users::UserRepo;

/// All repositories over one pool, plus the aggregate readers.
#[derive(Clone)]
pub struct Store {
    pub users: UserRepo,
    pub categories: CategoryRepo,
    pub products: ProductRepo,
    pub carts: CartRepo,
    pub cart_items: CartItemRepo,
    pub orders: OrderRepo,
    pub order_items: OrderItemRepo,
}

impl Store {
    /// Build a store with the default Argon2 credential hasher.
    pub fn new(pool: PgPool) -> Self {
        Self::with_hasher(pool, Arc::new(Argon2Hasher))
    }

    /// Build a store with a caller-supplied credential hasher.
    pub fn with_hasher(pool: PgPool, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            users: UserRepo::new(pool.clone(), hasher),
            categories: CategoryRepo::new(pool.clone()),
            products: ProductRepo::new(pool.clone()),
            carts: CartRepo::new(pool.clone()),
            cart_items: CartItemRepo::new(pool.clone()),
            orders: OrderRepo::new(pool.clone()),
            order_items: OrderItemRepo::new(pool),
        }
    }

    /// A cart and all its lines, by the owner's username.
    pub async fn cart_with_items(&self, username: &str) -> Result<CartWithItems> {
        aggregates::cart_with_items(&self.carts, &self.cart_items, username).await
    }

    /// A cart and all its lines, by cart id.
    pub async fn cart_with_items_by_id(&self, cart_id: i32) -> Result<CartWithItems> {
        aggregates::cart_with_items_by_id(&self.carts, &self.cart_items, cart_id).await
    }

    /// An order and all its lines. An existing order with zero lines is a
    /// miss.
    pub async fn order_with_items(&self, order_id: i32) -> Result<OrderWithItems> {
        aggregates::order_with_items(&self.orders, &self.order_items, order_id).await
    }

    /// A category and every product referencing it.
    pub async fn category_with_products(&self, category_id: i32) -> Result<CategoryWithProducts> {
        aggregates::category_with_products(&self.categories, category_id).await
    }
}
