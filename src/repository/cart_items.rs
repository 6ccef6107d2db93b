//! Cart item repository.
//!
//! Adding an item is an atomic insert-or-increment: two concurrent adds for
//! the same (cart, product) pair both land, and the quantities accumulate.
//! The (cart_id, product_id) uniqueness constraint is the invariant's source
//! of truth.

use sea_query::{Expr, PostgresQueryBuilder, Query};
use sqlx::PgPool;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::fields::{build_set_clause, FieldUpdates};
use crate::models::{CartItem, CartLine};
use crate::schema::CartItems;

const CART_ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity";

const UPDATABLE: &[(&str, &str)] = &[("quantity", "quantity")];

/// Atomic add-or-increment. The conflict clause closes the race a
/// check-then-act sequence would leave between the existence check and the
/// write.
const UPSERT_SQL: &str = "\
INSERT INTO cart_items (cart_id, product_id, quantity) \
VALUES ($1, $2, $3) \
ON CONFLICT (cart_id, product_id) \
DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
RETURNING id, cart_id, product_id, quantity";

/// Join of cart items with their product's descriptive fields.
const LINES_SQL: &str = "\
SELECT ci.cart_id, ci.id AS cart_item_id, ci.quantity, \
       p.id AS product_id, p.name, p.description, p.price, \
       p.image_url, p.stock, p.category_id \
FROM cart_items AS ci \
JOIN products AS p ON ci.product_id = p.id \
WHERE ci.cart_id = $1";

/// Repository for cart item rows.
#[derive(Clone)]
pub struct CartItemRepo {
    pool: PgPool,
}

impl CartItemRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a product to a cart, incrementing the quantity if the pair
    /// already has a row. Repeated adds accumulate by design.
    pub async fn add(&self, cart_id: i32, product_id: i32, quantity: i32) -> Result<CartItem> {
        let item = sqlx::query_as::<_, CartItem>(UPSERT_SQL)
            .bind(cart_id)
            .bind(product_id)
            .bind(quantity)
            .fetch_one(&self.pool)
            .await?;

        debug!(cart_id, product_id, quantity = item.quantity, "added cart item");
        Ok(item)
    }

    pub async fn find_all(&self) -> Result<Vec<CartItem>> {
        let sql = Query::select()
            .columns([
                CartItems::Id,
                CartItems::CartId,
                CartItems::ProductId,
                CartItems::Quantity,
            ])
            .from(CartItems::Table)
            .to_string(PostgresQueryBuilder);

        Ok(sqlx::query_as::<_, CartItem>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<CartItem> {
        let sql = format!("SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE id = $1");
        sqlx::query_as::<_, CartItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("cart item", id))
    }

    /// All lines in a cart, each joined with its product. An empty cart
    /// yields an empty list, not an error.
    pub async fn for_cart(&self, cart_id: i32) -> Result<Vec<CartLine>> {
        Ok(sqlx::query_as::<_, CartLine>(LINES_SQL)
            .bind(cart_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn update(&self, id: i32, updates: FieldUpdates) -> Result<CartItem> {
        let set = build_set_clause(&updates, UPDATABLE)?;
        let sql = format!(
            "UPDATE cart_items SET {} WHERE id = ${} RETURNING {CART_ITEM_COLUMNS}",
            set.fragment,
            set.next_index()
        );

        let mut query = sqlx::query_as::<_, CartItem>(&sql);
        for value in set.binds {
            query = query.bind(value);
        }

        query
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("cart item", id))
    }

    pub async fn remove(&self, id: i32) -> Result<()> {
        let sql = Query::delete()
            .from_table(CartItems::Table)
            .and_where(Expr::col(CartItems::Id).eq(id))
            .to_string(PostgresQueryBuilder);

        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("cart item", id));
        }

        Ok(())
    }

    /// Remove every item in a cart, returning how many were cleared.
    /// Clearing an already-empty cart is a miss.
    pub async fn clear(&self, cart_id: i32) -> Result<u64> {
        let sql = Query::delete()
            .from_table(CartItems::Table)
            .and_where(Expr::col(CartItems::CartId).eq(cart_id))
            .to_string(PostgresQueryBuilder);

        let result = sqlx::query(&sql).execute(&self.pool).await?;
        let cleared = result.rows_affected();
        if cleared == 0 {
            return Err(StoreError::not_found("cart items for cart", cart_id));
        }

        debug!(cart_id, cleared, "cleared cart");
        Ok(cleared)
    }
}
