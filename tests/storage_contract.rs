//! PostgreSQL storage contract tests using testcontainers.
//!
//! Run with: cargo test --test storage_contract -- --nocapture
//!
//! These tests spin up PostgreSQL in a container, apply the schema, and
//! exercise the conflict-clause semantics that string-level unit tests
//! cannot: cart-item adds accumulating into one row, and bulk order-item
//! inserts suppressing duplicate pairs.

use std::time::Duration;

use rust_decimal::Decimal;
use shopcore::models::{NewOrder, NewOrderItem, NewProduct, NewUser};
use shopcore::schema::init_schema;
use shopcore::{ErrorKind, Store};
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    GenericImage, ImageExt,
};

/// Start PostgreSQL container.
///
/// Returns (container, connection_string) where connection_string is suitable
/// for sqlx PgPool connection.
async fn start_postgres() -> (testcontainers::ContainerAsync<GenericImage>, String) {
    // PostgreSQL prints "database system is ready to accept connections"
    // twice: once during initial setup and once when fully ready. Wait for
    // the message, then add a small delay to ensure full readiness.
    let image = GenericImage::new("postgres", "16")
        .with_exposed_port(5432.tcp())
        .with_wait_for(WaitFor::message_on_stdout(
            "database system is ready to accept connections",
        ));

    let container = image
        .with_env_var("POSTGRES_USER", "shopcore")
        .with_env_var("POSTGRES_PASSWORD", "shopcore")
        .with_env_var("POSTGRES_DB", "shopcore")
        .with_startup_timeout(Duration::from_secs(60))
        .start()
        .await
        .expect("Failed to start postgres container");

    tokio::time::sleep(Duration::from_secs(1)).await;

    let host_port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get mapped port");

    let host = container
        .get_host()
        .await
        .expect("Failed to get container host");

    let connection_string = format!("postgres://shopcore:shopcore@{}:{}/shopcore", host, host_port);

    println!("PostgreSQL available at: {}", connection_string);

    (container, connection_string)
}

/// Connect to PostgreSQL and apply the schema.
async fn connect_and_init(connection_string: &str) -> sqlx::PgPool {
    let pool = sqlx::PgPool::connect(connection_string)
        .await
        .expect("Failed to connect to PostgreSQL");

    init_schema(&pool).await.expect("Failed to apply schema");

    pool
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password: "hunter2".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: format!("{username}@example.com"),
        is_admin: false,
    }
}

fn new_product(name: &str, cents: i64) -> NewProduct {
    NewProduct {
        id: None,
        name: name.to_string(),
        description: format!("a {name}"),
        price: Decimal::new(cents, 2),
        image_url: None,
        stock: 10,
        category_id: None,
    }
}

#[tokio::test]
async fn test_cart_item_add_accumulates_into_one_row() {
    let (_container, connection_string) = start_postgres().await;
    let pool = connect_and_init(&connection_string).await;
    let store = Store::new(pool);

    let user = store.users.create(new_user("u1")).await.unwrap();
    let product = store.products.create(new_product("mug", 1999)).await.unwrap();

    // registration created the cart
    let cart = store.carts.get(&user.username).await.unwrap();

    let first = store.cart_items.add(cart.id, product.id, 2).await.unwrap();
    assert_eq!(first.quantity, 2);

    let second = store.cart_items.add(cart.id, product.id, 3).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.quantity, 5);

    let lines = store.cart_items.for_cart(cart.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 5);
    assert_eq!(lines[0].product_id, product.id);

    // the by-id aggregate sees the same single merged line
    let aggregate = store.cart_with_items_by_id(cart.id).await.unwrap();
    assert_eq!(aggregate.cart.username, "u1");
    assert_eq!(aggregate.items.len(), 1);
    assert_eq!(aggregate.items[0].quantity, 5);
}

#[tokio::test]
async fn test_order_item_bulk_insert_skips_duplicate_pairs() {
    let (_container, connection_string) = start_postgres().await;
    let pool = connect_and_init(&connection_string).await;
    let store = Store::new(pool);

    let user = store.users.create(new_user("u2")).await.unwrap();
    let product = store.products.create(new_product("plate", 899)).await.unwrap();
    let order = store
        .orders
        .create(NewOrder {
            username: user.username.clone(),
            total: Decimal::new(1798, 2),
        })
        .await
        .unwrap();

    let item = NewOrderItem {
        order_id: order.id,
        product_id: product.id,
        quantity: 2,
        price_at_purchase: Decimal::new(899, 2),
    };

    let inserted = store
        .order_items
        .add_bulk(&[item.clone(), item.clone()])
        .await
        .unwrap();
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].quantity, 2);

    // a later bulk add of the same pair inserts nothing
    let again = store.order_items.add_bulk(&[item]).await.unwrap();
    assert!(again.is_empty());

    let lines = store.order_items.for_order(order.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].price_at_purchase, Decimal::new(899, 2));
}

#[tokio::test]
async fn test_duplicate_registration_and_single_add_conflict() {
    let (_container, connection_string) = start_postgres().await;
    let pool = connect_and_init(&connection_string).await;
    let store = Store::new(pool);

    let user = store.users.create(new_user("u3")).await.unwrap();
    let err = store.users.create(new_user("u3")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);

    let product = store.products.create(new_product("bowl", 1250)).await.unwrap();
    let order = store
        .orders
        .create(NewOrder {
            username: user.username.clone(),
            total: Decimal::new(1250, 2),
        })
        .await
        .unwrap();

    let item = NewOrderItem {
        order_id: order.id,
        product_id: product.id,
        quantity: 1,
        price_at_purchase: Decimal::new(1250, 2),
    };
    store.order_items.add(item.clone()).await.unwrap();

    // the single-row path surfaces the collision instead of skipping it
    let err = store.order_items.add(item).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);
}
