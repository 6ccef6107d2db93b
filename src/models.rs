//! Row records and aggregate response shapes.
//!
//! These are the plain records the core hands to its callers. Monetary
//! fields are `Decimal` in memory and fixed-point strings on the wire, never
//! floating point. The user's password hash is never part of a record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered user. The stored password hash is deliberately absent.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Input record for registering a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// Input record for creating a category.
///
/// `id` is only consulted by the duplicate pre-check; the row id is always
/// server-assigned.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock: i32,
    #[serde(rename = "categoryID")]
    pub category_id: Option<i32>,
}

/// Input record for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock: i32,
    #[serde(rename = "categoryID", default)]
    pub category_id: Option<i32>,
}

/// A user's cart. One per user, created alongside the user row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Cart {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
    pub id: i32,
    #[serde(rename = "cartID")]
    pub cart_id: i32,
    #[serde(rename = "productID")]
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i32,
    pub username: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Input record for creating an order.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub username: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// A line on an order. `price_at_purchase` snapshots the product price at
/// order time; later price changes never alter historical orders.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
    pub id: i32,
    #[serde(rename = "orderID")]
    pub order_id: i32,
    #[serde(rename = "productID")]
    pub product_id: i32,
    pub quantity: i32,
    #[serde(rename = "pricePurchased", with = "rust_decimal::serde::str")]
    pub price_at_purchase: Decimal,
}

/// Input record for adding an order item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_at_purchase: Decimal,
}

/// A cart item joined with its product's descriptive fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLine {
    #[serde(rename = "cartID")]
    pub cart_id: i32,
    #[serde(rename = "cartItemID")]
    pub cart_item_id: i32,
    pub quantity: i32,
    #[serde(rename = "productID")]
    pub product_id: i32,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub stock: i32,
    #[serde(rename = "categoryID")]
    pub category_id: Option<i32>,
}

/// An order item joined with its product's descriptive fields.
///
/// Carries both the purchase-time price snapshot and the product's current
/// price.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderLine {
    #[serde(rename = "orderID")]
    pub order_id: i32,
    #[serde(rename = "orderItemID")]
    pub order_item_id: i32,
    pub quantity: i32,
    #[serde(rename = "priceAtPurchase", with = "rust_decimal::serde::str")]
    pub price_at_purchase: Decimal,
    #[serde(rename = "productID")]
    pub product_id: i32,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub stock: i32,
    #[serde(rename = "categoryID")]
    pub category_id: Option<i32>,
}

/// A cart with its joined item lines. Empty `items` is a valid state.
#[derive(Debug, Clone, Serialize)]
pub struct CartWithItems {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartLine>,
}

/// An order with its joined item lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
}

/// A category with the products that reference it. Empty `products` is a
/// valid state. On the wire the list shares the `items` key with the cart
/// and order aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithProducts {
    #[serde(flatten)]
    pub category: Category,
    #[serde(rename = "items")]
    pub products: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_serializes_as_fixed_point_string() {
        let product = Product {
            id: 1,
            name: "mug".into(),
            description: "a mug".into(),
            price: Decimal::new(1999, 2),
            image_url: None,
            stock: 3,
            category_id: Some(2),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["price"], serde_json::json!("19.99"));
        assert_eq!(json["categoryID"], serde_json::json!(2));
        assert_eq!(json["imageUrl"], serde_json::Value::Null);
    }

    #[test]
    fn test_user_record_has_no_password_key() {
        let user = User {
            username: "u1".into(),
            first_name: "U".into(),
            last_name: "One".into(),
            email: "u1@example.com".into(),
            is_admin: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("firstName").is_some());
        assert!(json.get("isAdmin").is_some());
    }

    #[test]
    fn test_aggregate_flattens_owner_keys() {
        let cart = CartWithItems {
            cart: Cart {
                id: 7,
                username: "u1".into(),
            },
            items: vec![],
        };
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["id"], serde_json::json!(7));
        assert_eq!(json["username"], serde_json::json!("u1"));
        assert_eq!(json["items"], serde_json::json!([]));
    }

    #[test]
    fn test_category_aggregate_lists_products_under_items() {
        let aggregate = CategoryWithProducts {
            category: Category {
                id: 3,
                name: "garden".into(),
            },
            products: vec![],
        };
        let json = serde_json::to_value(&aggregate).unwrap();
        assert_eq!(json["items"], serde_json::json!([]));
        assert!(json.get("products").is_none());
        assert_eq!(json["name"], serde_json::json!("garden"));
    }

    #[test]
    fn test_order_item_uses_purchase_price_alias() {
        let item = OrderItem {
            id: 1,
            order_id: 2,
            product_id: 3,
            quantity: 4,
            price_at_purchase: Decimal::new(500, 2),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["pricePurchased"], serde_json::json!("5.00"));
        assert_eq!(json["orderID"], serde_json::json!(2));
    }
}
