//! Product repository.

use sea_query::{Expr, PostgresQueryBuilder, Query};
use sqlx::PgPool;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::fields::{build_set_clause, FieldUpdates};
use crate::models::{NewProduct, Product};
use crate::schema::Products;

const PRODUCT_COLUMNS: &str = "id, name, description, price, image_url, stock, category_id";

const UPDATABLE: &[(&str, &str)] = &[
    ("name", "name"),
    ("description", "description"),
    ("price", "price"),
    ("imageUrl", "image_url"),
    ("stock", "stock"),
    ("categoryID", "category_id"),
];

/// Repository for product rows.
#[derive(Clone)]
pub struct ProductRepo {
    pool: PgPool,
}

impl ProductRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a product. A supplied id is only consulted for a friendlier
    /// duplicate message; the row id is server-assigned.
    pub async fn create(&self, new: NewProduct) -> Result<Product> {
        if let Some(id) = new.id {
            let precheck = Query::select()
                .column(Products::Id)
                .from(Products::Table)
                .and_where(Expr::col(Products::Id).eq(id))
                .to_string(PostgresQueryBuilder);

            if sqlx::query(&precheck)
                .fetch_optional(&self.pool)
                .await?
                .is_some()
            {
                return Err(StoreError::duplicate("product", id));
            }
        }

        let insert = format!(
            "INSERT INTO products (name, description, price, image_url, stock, category_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&insert)
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.price)
            .bind(&new.image_url)
            .bind(new.stock)
            .bind(new.category_id)
            .fetch_one(&self.pool)
            .await?;

        info!(id = product.id, "created product");
        Ok(product)
    }

    pub async fn find_all(&self) -> Result<Vec<Product>> {
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
            .to_string(PostgresQueryBuilder);

        Ok(sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    pub async fn update(&self, id: i32, updates: FieldUpdates) -> Result<Product> {
        let set = build_set_clause(&updates, UPDATABLE)?;
        let sql = format!(
            "UPDATE products SET {} WHERE id = ${} RETURNING {PRODUCT_COLUMNS}",
            set.fragment,
            set.next_index()
        );

        let mut query = sqlx::query_as::<_, Product>(&sql);
        for value in set.binds {
            query = query.bind(value);
        }

        query
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    pub async fn remove(&self, id: i32) -> Result<()> {
        let sql = Query::delete()
            .from_table(Products::Table)
            .and_where(Expr::col(Products::Id).eq(id))
            .to_string(PostgresQueryBuilder);

        let result = sqlx::query(&sql).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("product", id));
        }

        info!(id, "removed product");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::SqlValue;
    use rust_decimal::Decimal;

    #[test]
    fn test_update_covers_every_product_field() {
        let updates = FieldUpdates::new()
            .set("name", "mug")
            .set("description", "a mug")
            .set("price", Decimal::new(1999, 2))
            .set("imageUrl", "https://img.example/mug.png")
            .set("stock", 10)
            .set("categoryID", 2);
        let set = build_set_clause(&updates, UPDATABLE).unwrap();
        assert_eq!(
            set.fragment,
            "\"name\" = $1, \"description\" = $2, \"price\" = $3, \
             \"image_url\" = $4, \"stock\" = $5, \"category_id\" = $6"
        );
        assert_eq!(set.next_index(), 7);
        assert_eq!(set.binds[2], SqlValue::Decimal(Decimal::new(1999, 2)));
    }

    #[test]
    fn test_update_rejects_id() {
        let updates = FieldUpdates::new().set("id", 5);
        assert!(build_set_clause(&updates, UPDATABLE).is_err());
    }
}
