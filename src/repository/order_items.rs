//! Order item repository.
//!
//! The bulk path inserts a whole order's lines in one statement and silently
//! skips rows that collide on (order_id, product_id) — no merge, unlike cart
//! items. Only the rows actually inserted are returned.

use sea_query::{Expr, PostgresQueryBuilder, Query};
use sqlx::PgPool;
use tracing::debug;

use crate::error::{map_insert_err, Result, StoreError};
use crate::fields::{build_set_clause, FieldUpdates};
use crate::models::{NewOrderItem, OrderItem, OrderLine};
use crate::schema::OrderItems;

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price_at_purchase";

const UPDATABLE: &[(&str, &str)] = &[("quantity", "quantity")];

/// Join of order items with their product's descriptive fields.
const LINES_SQL: &str = "\
SELECT oi.order_id, oi.id AS order_item_id, oi.quantity, oi.price_at_purchase, \
       p.id AS product_id, p.name, p.description, p.price, \
       p.image_url, p.stock, p.category_id \
FROM order_items AS oi \
JOIN products AS p ON oi.product_id = p.id \
WHERE oi.order_id = $1";

/// Multi-row insert with duplicate suppression, for `n` items.
///
/// Placeholders are laid out per item as ($4k+1 .. $4k+4) so bind order
/// follows item order.
fn bulk_insert_sql(n: usize) -> String {
    let placeholders = (0..n)
        .map(|i| {
            let base = i * 4;
            format!("(${}, ${}, ${}, ${})", base + 1, base + 2, base + 3, base + 4)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase) \
         VALUES {placeholders} \
         ON CONFLICT (order_id, product_id) DO NOTHING \
         RETURNING {ORDER_ITEM_COLUMNS}"
    )
}

/// Repository for order item rows.
#[derive(Clone)]
pub struct OrderItemRepo {
    pool: PgPool,
}

impl OrderItemRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a single order item. A second item for the same
    /// (order, product) pair is a duplicate.
    pub async fn add(&self, new: NewOrderItem) -> Result<OrderItem> {
        let insert = format!(
            "INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, OrderItem>(&insert)
            .bind(new.order_id)
            .bind(new.product_id)
            .bind(new.quantity)
            .bind(new.price_at_purchase)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                map_insert_err(
                    e,
                    "order item",
                    format!("({}, {})", new.order_id, new.product_id),
                )
            })
    }

    /// Insert many order items in one statement, skipping rows that collide
    /// on (order_id, product_id). Returns only the rows actually inserted;
    /// an empty input is an empty result with no statement executed.
    pub async fn add_bulk(&self, items: &[NewOrderItem]) -> Result<Vec<OrderItem>> {
        if items.is_empty() {
            return Ok(vec![]);
        }

        let sql = bulk_insert_sql(items.len());
        let mut query = sqlx::query_as::<_, OrderItem>(&sql);
        for item in items {
            query = query
                .bind(item.order_id)
                .bind(item.product_id)
                .bind(item.quantity)
                .bind(item.price_at_purchase);
        }

        let inserted = query.fetch_all(&self.pool).await?;
        debug!(
            requested = items.len(),
            inserted = inserted.len(),
            "bulk-inserted order items"
        );
        Ok(inserted)
    }

    pub async fn find_all(&self) -> Result<Vec<OrderItem>> {
        let sql = Query::select()
            .columns([
                OrderItems::Id,
                OrderItems::OrderId,
                OrderItems::ProductId,
                OrderItems::Quantity,
                OrderItems::PriceAtPurchase,
            ])
            .from(OrderItems::Table)
            .to_string(PostgresQueryBuilder);

        Ok(sqlx::query_as::<_, OrderItem>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<OrderItem> {
        let sql = format!("SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE id = $1");
        sqlx::query_as::<_, OrderItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("order item", id))
    }

    /// All lines on an order, each joined with its product. Emptiness policy
    /// is the aggregate reader's concern.
    pub async fn for_order(&self, order_id: i32) -> Result<Vec<OrderLine>> {
        Ok(sqlx::query_as::<_, OrderLine>(LINES_SQL)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn update(&self, id: i32, updates: FieldUpdates) -> Result<OrderItem> {
        let set = build_set_clause(&updates, UPDATABLE)?;
        let sql = format!(
            "UPDATE order_items SET {} WHERE id = ${} RETURNING {ORDER_ITEM_COLUMNS}",
            set.fragment,
            set.next_index()
        );

        let mut query = sqlx::query_as::<_, OrderItem>(&sql);
        for value in set.binds {
            query = query.bind(value);
        }

        query
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("order item", id))
    }

    pub async fn remove(&self, id: i32) -> Result<()> {
        let sql = Query::delete()
            .from_table(OrderItems::Table)
            .and_where(Expr::col(OrderItems::Id).eq(id))
            .to_string(PostgresQueryBuilder);

        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order item", id));
        }

        Ok(())
    }
}
