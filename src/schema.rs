//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query
//! building, plus the DDL for bootstrapping a fresh database. Uniqueness
//! invariants live here as constraints: one cart per user, one cart item per
//! (cart, product), one order item per (order, product).

use sea_query::Iden;
use sqlx::PgPool;

use crate::error::Result;

/// Users table schema.
#[derive(Iden)]
pub enum Users {
    Table,
    #[iden = "username"]
    Username,
    #[iden = "password"]
    Password,
    #[iden = "first_name"]
    FirstName,
    #[iden = "last_name"]
    LastName,
    #[iden = "email"]
    Email,
    #[iden = "is_admin"]
    IsAdmin,
    #[iden = "created_at"]
    CreatedAt,
}

/// Categories table schema.
#[derive(Iden)]
pub enum Categories {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
}

/// Products table schema.
#[derive(Iden)]
pub enum Products {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "description"]
    Description,
    #[iden = "price"]
    Price,
    #[iden = "image_url"]
    ImageUrl,
    #[iden = "stock"]
    Stock,
    #[iden = "category_id"]
    CategoryId,
}

/// Carts table schema.
#[derive(Iden)]
pub enum Carts {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "username"]
    Username,
}

/// Cart items table schema.
#[derive(Iden)]
pub enum CartItems {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "cart_id"]
    CartId,
    #[iden = "product_id"]
    ProductId,
    #[iden = "quantity"]
    Quantity,
}

/// Orders table schema.
#[derive(Iden)]
pub enum Orders {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "username"]
    Username,
    #[iden = "total"]
    Total,
    #[iden = "created_at"]
    CreatedAt,
}

/// Order items table schema.
#[derive(Iden)]
pub enum OrderItems {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "order_id"]
    OrderId,
    #[iden = "product_id"]
    ProductId,
    #[iden = "quantity"]
    Quantity,
    #[iden = "price_at_purchase"]
    PriceAtPurchase,
}

/// SQL for creating the users table.
pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    password TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL,
    is_admin BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// SQL for creating the categories table.
pub const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL for creating the products table.
pub const CREATE_PRODUCTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    price NUMERIC(10,2) NOT NULL,
    image_url TEXT,
    stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
    category_id INTEGER REFERENCES categories(id)
)
"#;

/// SQL for creating the carts table.
pub const CREATE_CARTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS carts (
    id SERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE REFERENCES users(username) ON DELETE CASCADE
)
"#;

/// SQL for creating the cart_items table.
pub const CREATE_CART_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cart_items (
    id SERIAL PRIMARY KEY,
    cart_id INTEGER NOT NULL REFERENCES carts(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES products(id),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    UNIQUE (cart_id, product_id)
)
"#;

/// SQL for creating the orders table.
pub const CREATE_ORDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id SERIAL PRIMARY KEY,
    username TEXT NOT NULL REFERENCES users(username),
    total NUMERIC(10,2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// SQL for creating the order_items table.
pub const CREATE_ORDER_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS order_items (
    id SERIAL PRIMARY KEY,
    order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES products(id),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    price_at_purchase NUMERIC(10,2) NOT NULL,
    UNIQUE (order_id, product_id)
)
"#;

/// All table DDL in dependency order.
const CREATE_TABLES: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_CATEGORIES_TABLE,
    CREATE_PRODUCTS_TABLE,
    CREATE_CARTS_TABLE,
    CREATE_CART_ITEMS_TABLE,
    CREATE_ORDERS_TABLE,
    CREATE_ORDER_ITEMS_TABLE,
];

/// Create all tables if they do not exist.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for ddl in CREATE_TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
