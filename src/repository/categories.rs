//! Category repository.

use sea_query::{Expr, PostgresQueryBuilder, Query};
use sqlx::PgPool;
use tracing::info;

use crate::error::{map_insert_err, Result, StoreError};
use crate::fields::{build_set_clause, FieldUpdates};
use crate::models::{Category, NewCategory, Product};
use crate::schema::{Categories, Products};

const UPDATABLE: &[(&str, &str)] = &[("name", "name")];

/// Repository for category rows.
#[derive(Clone)]
pub struct CategoryRepo {
    pool: PgPool,
}

impl CategoryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a category. A supplied id is only consulted for a friendlier
    /// duplicate message; the row id is server-assigned and name uniqueness
    /// is enforced by the store.
    pub async fn create(&self, new: NewCategory) -> Result<Category> {
        if let Some(id) = new.id {
            let precheck = Query::select()
                .column(Categories::Id)
                .from(Categories::Table)
                .and_where(Expr::col(Categories::Id).eq(id))
                .to_string(PostgresQueryBuilder);

            if sqlx::query(&precheck)
                .fetch_optional(&self.pool)
                .await?
                .is_some()
            {
                return Err(StoreError::duplicate("category", id));
            }
        }

        let category =
            sqlx::query_as::<_, Category>("INSERT INTO categories (name) VALUES ($1) RETURNING id, name")
                .bind(&new.name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_insert_err(e, "category", &new.name))?;

        info!(id = category.id, "created category");
        Ok(category)
    }

    pub async fn find_all(&self) -> Result<Vec<Category>> {
        let sql = Query::select()
            .columns([Categories::Id, Categories::Name])
            .from(Categories::Table)
            .to_string(PostgresQueryBuilder);

        Ok(sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("category", id))
    }

    /// All products referencing a category. An empty list is a valid result;
    /// the category's own existence is the aggregate reader's concern.
    pub async fn products(&self, category_id: i32) -> Result<Vec<Product>> {
        let sql = Query::select()
            .columns([
                Products::Id,
                Products::Name,
                Products::Description,
                Products::Price,
                Products::ImageUrl,
                Products::Stock,
                Products::CategoryId,
            ])
            .from(Products::Table)
            .and_where(Expr::col(Products::CategoryId).eq(category_id))
            .to_string(PostgresQueryBuilder);

        Ok(sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn update(&self, id: i32, updates: FieldUpdates) -> Result<Category> {
        let set = build_set_clause(&updates, UPDATABLE)?;
        let sql = format!(
            "UPDATE categories SET {} WHERE id = ${} RETURNING id, name",
            set.fragment,
            set.next_index()
        );

        let mut query = sqlx::query_as::<_, Category>(&sql);
        for value in set.binds {
            query = query.bind(value);
        }

        query
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("category", id))
    }

    pub async fn remove(&self, id: i32) -> Result<()> {
        let sql = Query::delete()
            .from_table(Categories::Table)
            .and_where(Expr::col(Categories::Id).eq(id))
            .to_string(PostgresQueryBuilder);

        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("category", id));
        }

        info!(id, "removed category");
        Ok(())
    }
}
