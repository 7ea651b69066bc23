//! PostgreSQL integration tests for the storage layer.
//!
//! These tests use a shared PostgreSQL container for efficiency.

use std::sync::Arc;
use std::time::Duration;

use common::{ItemId, OrderStatus, UserId};
use rust_decimal_macros::dec;
use serial_test::serial;
use sqlx::PgPool;
use store::{NewItem, NewOrder, NewOrderLine, Store, StoreError, items, orders};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_catalog_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/002_create_order_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> Store {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, items, categories RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    Store::new(pool)
}

fn part(name: &str, price: Option<rust_decimal::Decimal>, stock: i64) -> NewItem {
    NewItem {
        name: name.to_string(),
        description: None,
        price,
        stock,
        category_id: None,
    }
}

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
#[serial]
async fn insert_and_get_item() {
    let store = get_test_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let inserted = items::insert(&mut conn, &part("Brake pad", Some(dec!(89.99)), 12))
        .await
        .unwrap();
    assert_eq!(inserted.name, "Brake pad");
    assert_eq!(inserted.price, Some(dec!(89.99)));
    assert_eq!(inserted.stock, 12);

    let fetched = items::get(&mut conn, inserted.id).await.unwrap().unwrap();
    assert_eq!(fetched, inserted);
}

#[tokio::test]
#[serial]
async fn get_missing_item_returns_none() {
    let store = get_test_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let fetched = items::get(&mut conn, ItemId::new(9999)).await.unwrap();
    assert!(fetched.is_none());
}

#[tokio::test]
#[serial]
async fn unpriced_item_roundtrips_as_none() {
    let store = get_test_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let inserted = items::insert(&mut conn, &part("Unpriced gasket", None, 5))
        .await
        .unwrap();
    assert_eq!(inserted.price, None);
}

#[tokio::test]
#[serial]
async fn lock_for_update_returns_rows_in_ascending_id_order() {
    let store = get_test_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let a = items::insert(&mut conn, &part("Alternator", Some(dec!(139.50)), 6))
        .await
        .unwrap();
    let b = items::insert(&mut conn, &part("Battery", Some(dec!(99.99)), 15))
        .await
        .unwrap();
    let c = items::insert(&mut conn, &part("Coil", Some(dec!(59.99)), 14))
        .await
        .unwrap();
    drop(conn);

    let mut tx = store.begin(LOCK_TIMEOUT).await.unwrap();
    // Request out of order; rows must come back sorted by id.
    let rows = items::lock_for_update(&mut tx, &[c.id, a.id, b.id])
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let ids: Vec<ItemId> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![a.id, b.id, c.id]);
}

#[tokio::test]
#[serial]
async fn lock_for_update_omits_missing_ids() {
    let store = get_test_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let a = items::insert(&mut conn, &part("Fan belt", Some(dec!(24.99)), 50))
        .await
        .unwrap();
    drop(conn);

    let mut tx = store.begin(LOCK_TIMEOUT).await.unwrap();
    let rows = items::lock_for_update(&mut tx, &[a.id, ItemId::new(9999)])
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, a.id);
}

#[tokio::test]
#[serial]
async fn decrement_stock_is_visible_after_commit() {
    let store = get_test_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let a = items::insert(&mut conn, &part("Spark plug", Some(dec!(14.99)), 35))
        .await
        .unwrap();
    drop(conn);

    let mut tx = store.begin(LOCK_TIMEOUT).await.unwrap();
    items::lock_for_update(&mut tx, &[a.id]).await.unwrap();
    items::decrement_stock(&mut tx, a.id, 10).await.unwrap();
    tx.commit().await.unwrap();

    let mut conn = store.pool().acquire().await.unwrap();
    let fetched = items::get(&mut conn, a.id).await.unwrap().unwrap();
    assert_eq!(fetched.stock, 25);
}

#[tokio::test]
#[serial]
async fn decrement_below_zero_is_rejected_by_constraint() {
    let store = get_test_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let a = items::insert(&mut conn, &part("Oil filter", Some(dec!(17.50)), 2))
        .await
        .unwrap();
    drop(conn);

    let mut tx = store.begin(LOCK_TIMEOUT).await.unwrap();
    items::lock_for_update(&mut tx, &[a.id]).await.unwrap();
    let err = items::decrement_stock(&mut tx, a.id, 3).await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
    drop(tx);

    // Rolled back: stock untouched.
    let mut conn = store.pool().acquire().await.unwrap();
    let fetched = items::get(&mut conn, a.id).await.unwrap().unwrap();
    assert_eq!(fetched.stock, 2);
}

#[tokio::test]
#[serial]
async fn contended_lock_times_out_as_lock_timeout() {
    let store = get_test_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let a = items::insert(&mut conn, &part("Radiator", Some(dec!(189.00)), 7))
        .await
        .unwrap();
    drop(conn);

    // First transaction holds the row lock.
    let mut holder = store.begin(LOCK_TIMEOUT).await.unwrap();
    items::lock_for_update(&mut holder, &[a.id]).await.unwrap();

    // Second transaction gives up quickly and must see a typed timeout.
    let mut waiter = store.begin(Duration::from_millis(100)).await.unwrap();
    let err = items::lock_for_update(&mut waiter, &[a.id])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::LockTimeout));

    drop(waiter);
    holder.rollback().await.unwrap();
}

#[tokio::test]
#[serial]
async fn order_and_lines_roundtrip() {
    let store = get_test_store().await;
    let mut conn = store.pool().acquire().await.unwrap();

    let a = items::insert(&mut conn, &part("Starter motor", Some(dec!(329.00)), 4))
        .await
        .unwrap();
    let b = items::insert(&mut conn, &part("Relay", Some(dec!(19.99)), 40))
        .await
        .unwrap();

    let order = orders::insert_order(
        &mut conn,
        &NewOrder {
            user_id: Some(UserId::new(1)),
            customer_name: Some("Dana Fixit".to_string()),
            customer_email: "dana@example.com".to_string(),
            notes: Some("Leave at the workshop door".to_string()),
            total_amount: dec!(368.98),
        },
    )
    .await
    .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, dec!(368.98));
    assert_eq!(order.customer_email, "dana@example.com");

    orders::insert_line(
        &mut conn,
        order.id,
        &NewOrderLine {
            item_id: a.id,
            quantity: 1,
            unit_price: dec!(329.00),
        },
    )
    .await
    .unwrap();
    orders::insert_line(
        &mut conn,
        order.id,
        &NewOrderLine {
            item_id: b.id,
            quantity: 2,
            unit_price: dec!(19.99),
        },
    )
    .await
    .unwrap();

    let fetched = orders::get_order(&mut conn, order.id).await.unwrap().unwrap();
    assert_eq!(fetched, order);

    let lines = orders::lines_for_order(&mut conn, order.id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].item_id, a.id);
    assert_eq!(lines[0].quantity, 1);
    assert_eq!(lines[0].unit_price, dec!(329.00));
    assert_eq!(lines[1].item_id, b.id);
    assert_eq!(lines[1].quantity, 2);
}

#[tokio::test]
#[serial]
async fn dropped_transaction_rolls_back_order_writes() {
    let store = get_test_store().await;

    let order_id = {
        let mut tx = store.begin(LOCK_TIMEOUT).await.unwrap();
        let order = orders::insert_order(
            &mut tx,
            &NewOrder {
                user_id: None,
                customer_name: None,
                customer_email: "ghost@example.com".to_string(),
                notes: None,
                total_amount: dec!(0),
            },
        )
        .await
        .unwrap();
        order.id
        // tx dropped here without commit
    };

    let mut conn = store.pool().acquire().await.unwrap();
    let fetched = orders::get_order(&mut conn, order_id).await.unwrap();
    assert!(fetched.is_none());
}
