//! Cart repository.
//!
//! Carts are created alongside users (see the user repository); the direct
//! `create` path exists for completeness and enforces the one-cart-per-user
//! invariant against the username.

use sea_query::{Expr, PostgresQueryBuilder, Query};
use sqlx::PgPool;
use tracing::info;

use crate::error::{map_insert_err, Result, StoreError};
use crate::fields::{build_set_clause, FieldUpdates};
use crate::models::Cart;
use crate::schema::Carts;

const UPDATABLE: &[(&str, &str)] = &[("username", "username")];

/// Repository for cart rows.
#[derive(Clone)]
pub struct CartRepo {
    pool: PgPool,
}

impl CartRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a cart for a user. One cart per user; the username uniqueness
    /// constraint backs the pre-check.
    pub async fn create(&self, username: &str) -> Result<Cart> {
        let precheck = Query::select()
            .column(Carts::Username)
            .from(Carts::Table)
            .and_where(Expr::col(Carts::Username).eq(username))
            .to_string(PostgresQueryBuilder);

        if sqlx::query(&precheck)
            .fetch_optional(&self.pool)
            .await?
            .is_some()
        {
            return Err(StoreError::duplicate("cart", username));
        }

        let cart = sqlx::query_as::<_, Cart>(
            "INSERT INTO carts (username) VALUES ($1) RETURNING id, username",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "cart", username))?;

        info!(username, "created cart");
        Ok(cart)
    }

    pub async fn find_all(&self) -> Result<Vec<Cart>> {
        let sql = Query::select()
            .columns([Carts::Id, Carts::Username])
            .from(Carts::Table)
            .to_string(PostgresQueryBuilder);

        Ok(sqlx::query_as::<_, Cart>(&sql).fetch_all(&self.pool).await?)
    }

    /// Look up a cart by its owner's username (the natural key).
    pub async fn get(&self, username: &str) -> Result<Cart> {
        sqlx::query_as::<_, Cart>("SELECT id, username FROM carts WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("cart", username))
    }

    /// Look up a cart by its surrogate id.
    pub async fn get_by_id(&self, id: i32) -> Result<Cart> {
        sqlx::query_as::<_, Cart>("SELECT id, username FROM carts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("cart", id))
    }

    pub async fn update(&self, username: &str, updates: FieldUpdates) -> Result<Cart> {
        let set = build_set_clause(&updates, UPDATABLE)?;
        let sql = format!(
            "UPDATE carts SET {} WHERE username = ${} RETURNING id, username",
            set.fragment,
            set.next_index()
        );

        let mut query = sqlx::query_as::<_, Cart>(&sql);
        for value in set.binds {
            query = query.bind(value);
        }

        query
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("cart", username))
    }

    pub async fn remove(&self, username: &str) -> Result<()> {
        let sql = Query::delete()
            .from_table(Carts::Table)
            .and_where(Expr::col(Carts::Username).eq(username))
            .to_string(PostgresQueryBuilder);

        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("cart", username));
        }

        info!(username, "removed cart");
        Ok(())
    }
}
