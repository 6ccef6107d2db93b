//! Order repository.
//!
//! Orders are independent of carts; converting a cart into an order is
//! orchestration that lives outside this layer.

use sea_query::{Expr, PostgresQueryBuilder, Query};
use sqlx::PgPool;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::fields::{build_set_clause, FieldUpdates};
use crate::models::{NewOrder, Order};
use crate::schema::Orders;

const ORDER_COLUMNS: &str = "id, username, total, created_at";

const UPDATABLE: &[(&str, &str)] = &[("total", "total")];

/// Repository for order rows.
#[derive(Clone)]
pub struct OrderRepo {
    pool: PgPool,
}

impl OrderRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an order. Ids are server-assigned; there is no natural key to
    /// pre-check.
    pub async fn create(&self, new: NewOrder) -> Result<Order> {
        let insert = format!(
            "INSERT INTO orders (username, total) VALUES ($1, $2) RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&insert)
            .bind(&new.username)
            .bind(new.total)
            .fetch_one(&self.pool)
            .await?;

        info!(id = order.id, username = %order.username, "created order");
        Ok(order)
    }

    pub async fn find_all(&self) -> Result<Vec<Order>> {
        let sql = Query::select()
            .columns([
                Orders::Id,
                Orders::Username,
                Orders::Total,
                Orders::CreatedAt,
            ])
            .from(Orders::Table)
            .to_string(PostgresQueryBuilder);

        Ok(sqlx::query_as::<_, Order>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn get(&self, id: i32) -> Result<Order> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    /// All orders placed by a user. A user with no orders yields an empty
    /// list.
    pub async fn for_user(&self, username: &str) -> Result<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE username = $1");
        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(username)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn update(&self, id: i32, updates: FieldUpdates) -> Result<Order> {
        let set = build_set_clause(&updates, UPDATABLE)?;
        let sql = format!(
            "UPDATE orders SET {} WHERE id = ${} RETURNING {ORDER_COLUMNS}",
            set.fragment,
            set.next_index()
        );

        let mut query = sqlx::query_as::<_, Order>(&sql);
        for value in set.binds {
            query = query.bind(value);
        }

        query
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("order", id))
    }

    pub async fn remove(&self, id: i32) -> Result<()> {
        let sql = Query::delete()
            .from_table(Orders::Table)
            .and_where(Expr::col(Orders::Id).eq(id))
            .to_string(PostgresQueryBuilder);

        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("order", id));
        }

        info!(id, "removed order");
        Ok(())
    }
}
