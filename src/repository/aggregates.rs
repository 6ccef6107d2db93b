//! Read-side joins assembling an owning row with its children.
//!
//! All three readers share a shape: fetch the owner (miss is `NotFound`),
//! fetch the joined children, assemble one composite record. The emptiness
//! policies differ on purpose: a cart or category with no children is a
//! valid empty aggregate, while an order with no items is a miss — that
//! asymmetry is part of the observed contract (see DESIGN.md).

use crate::error::{Result, StoreError};
use crate::models::{
    Cart, CartLine, CartWithItems, Category, CategoryWithProducts, Order, OrderLine,
    OrderWithItems, Product,
};

use super::{CartItemRepo, CartRepo, CategoryRepo, OrderItemRepo, OrderRepo};

/// A cart and all its lines, looked up by the owner's username.
pub async fn cart_with_items(
    carts: &CartRepo,
    items: &CartItemRepo,
    username: &str,
) -> Result<CartWithItems> {
    let cart = carts.get(username).await?;
    let lines = items.for_cart(cart.id).await?;
    Ok(assemble_cart(cart, lines))
}

/// A cart and all its lines, looked up by the cart's surrogate id.
pub async fn cart_with_items_by_id(
    carts: &CartRepo,
    items: &CartItemRepo,
    cart_id: i32,
) -> Result<CartWithItems> {
    let cart = carts.get_by_id(cart_id).await?;
    let lines = items.for_cart(cart.id).await?;
    Ok(assemble_cart(cart, lines))
}

/// An order and all its lines. An existing order with zero lines is a miss.
pub async fn order_with_items(
    orders: &OrderRepo,
    items: &OrderItemRepo,
    order_id: i32,
) -> Result<OrderWithItems> {
    let order = orders.get(order_id).await?;
    let lines = items.for_order(order_id).await?;
    assemble_order(order, lines)
}

/// A category and every product referencing it.
pub async fn category_with_products(
    categories: &CategoryRepo,
    category_id: i32,
) -> Result<CategoryWithProducts> {
    let category = categories.get(category_id).await?;
    let products = categories.products(category_id).await?;
    Ok(assemble_category(category, products))
}

fn assemble_cart(cart: Cart, items: Vec<CartLine>) -> CartWithItems {
    CartWithItems { cart, items }
}

fn assemble_order(order: Order, items: Vec<OrderLine>) -> Result<OrderWithItems> {
    if items.is_empty() {
        return Err(StoreError::not_found("order items for order", order.id));
    }
    Ok(OrderWithItems { order, items })
}

fn assemble_category(category: Category, products: Vec<Product>) -> CategoryWithProducts {
    CategoryWithProducts { category, products }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[test]
    fn test_empty_cart_is_a_valid_aggregate() {
        let cart = Cart {
            id: 1,
            username: "u1".into(),
        };
        let aggregate = assemble_cart(cart, vec![]);
        assert!(aggregate.items.is_empty());
        assert_eq!(aggregate.cart.username, "u1");
    }

    #[test]
    fn test_empty_category_is_a_valid_aggregate() {
        let category = Category {
            id: 3,
            name: "empty shelf".into(),
        };
        let aggregate = assemble_category(category, vec![]);
        assert!(aggregate.products.is_empty());
    }

    #[test]
    fn test_order_with_no_items_is_a_miss() {
        let order = Order {
            id: 9,
            username: "u1".into(),
            total: Decimal::new(0, 2),
            created_at: Utc::now(),
        };
        let err = assemble_order(order, vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_order_with_items_assembles() {
        let order = Order {
            id: 9,
            username: "u1".into(),
            total: Decimal::new(1999, 2),
            created_at: Utc::now(),
        };
        let line = OrderLine {
            order_id: 9,
            order_item_id: 1,
            quantity: 1,
            price_at_purchase: Decimal::new(1999, 2),
            product_id: 5,
            name: "mug".into(),
            description: "a mug".into(),
            price: Decimal::new(2199, 2),
            image_url: None,
            stock: 4,
            category_id: None,
        };
        let aggregate = assemble_order(order, vec![line]).unwrap();
        assert_eq!(aggregate.items.len(), 1);
        // the snapshot price, not the current product price
        assert_eq!(aggregate.items[0].price_at_purchase, Decimal::new(1999, 2));
    }
}
