//! End-to-end query builder tests against a recording driver: what SQL
//! reaches the driver, in what order, with which bindings.

mod common;
use common::*;

use crucible_core::{QueryBuilder, SqlValue};

#[tokio::test]
async fn select_sends_sql_and_bindings() {
    let driver = RecordingDriver::new();
    driver.push_rows(vec![row(&[("id", SqlValue::Int(1))])]);

    let mut qb = QueryBuilder::new(&driver);
    let rows = qb
        .table("users")
        .select(&["id", "email"])
        .where_("active", "=", true)
        .where_in("role", ["admin", "owner"])
        .get()
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let calls = driver.recorded();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].0,
        "SELECT id, email FROM `users` WHERE active = ? AND role IN (?, ?)"
    );
    assert_eq!(
        calls[0].1,
        vec![
            SqlValue::Bool(true),
            SqlValue::Text(String::from("admin")),
            SqlValue::Text(String::from("owner"))
        ]
    );
}

#[tokio::test]
async fn first_applies_limit_one() {
    let driver = RecordingDriver::new();
    driver.push_rows(vec![
        row(&[("id", SqlValue::Int(1))]),
        row(&[("id", SqlValue::Int(2))]),
    ]);

    let mut qb = QueryBuilder::new(&driver);
    let first = qb.table("users").first().await.unwrap().unwrap();

    assert_eq!(first.get("id"), Some(&SqlValue::Int(1)));
    assert_eq!(driver.sql_log(), vec!["SELECT * FROM `users` LIMIT 1"]);
}

#[tokio::test]
async fn first_returns_none_on_empty_result() {
    let driver = RecordingDriver::new();
    let mut qb = QueryBuilder::new(&driver);
    assert!(qb.table("users").first().await.unwrap().is_none());
}

#[tokio::test]
async fn insert_reports_last_insert_id() {
    let driver = RecordingDriver::new();
    driver.set_last_insert_id(42);

    let mut qb = QueryBuilder::new(&driver);
    let id = qb
        .table("users")
        .insert(&[("email", SqlValue::from("a@b.c")), ("active", SqlValue::from(true))])
        .await
        .unwrap();

    assert_eq!(id, 42);
    let calls = driver.recorded();
    assert_eq!(
        calls[0].0,
        "INSERT INTO `users` (email, active) VALUES (?, ?)"
    );
    assert_eq!(calls[0].1.len(), 2);
}

#[tokio::test]
async fn update_binds_set_before_where() {
    let driver = RecordingDriver::new();
    driver.push_affected(3);

    let mut qb = QueryBuilder::new(&driver);
    let affected = qb
        .table("users")
        .where_("active", "=", false)
        .update(&[("status", SqlValue::from("archived"))])
        .await
        .unwrap();

    assert_eq!(affected, 3);
    let calls = driver.recorded();
    assert_eq!(
        calls[0].0,
        "UPDATE `users` SET status = ? WHERE active = ?"
    );
    assert_eq!(
        calls[0].1,
        vec![SqlValue::Text(String::from("archived")), SqlValue::Bool(false)]
    );
}

#[tokio::test]
async fn delete_without_filters_hits_whole_table() {
    let driver = RecordingDriver::new();
    driver.push_affected(7);

    let mut qb = QueryBuilder::new(&driver);
    let affected = qb.table("sessions").delete().await.unwrap();

    assert_eq!(affected, 7);
    assert_eq!(driver.sql_log(), vec!["DELETE FROM `sessions`"]);
}

#[tokio::test]
async fn count_reads_aggregate_column() {
    let driver = RecordingDriver::new();
    driver.push_rows(vec![row(&[("aggregate", SqlValue::Int(12))])]);

    let mut qb = QueryBuilder::new(&driver);
    let n = qb
        .table("users")
        .where_not_null("confirmed_at")
        .count()
        .await
        .unwrap();

    assert_eq!(n, 12);
    assert_eq!(
        driver.sql_log(),
        vec!["SELECT COUNT(*) AS aggregate FROM `users` WHERE confirmed_at IS NOT NULL"]
    );
}

#[tokio::test]
async fn sum_over_no_rows_is_null() {
    let driver = RecordingDriver::new();
    driver.push_rows(vec![row(&[("aggregate", SqlValue::Null)])]);

    let mut qb = QueryBuilder::new(&driver);
    let total = qb.table("orders").sum("total").await.unwrap();
    assert_eq!(total, SqlValue::Null);
}

#[tokio::test]
async fn increment_compiles_arithmetic_set() {
    let driver = RecordingDriver::new();
    driver.push_affected(1);

    let mut qb = QueryBuilder::new(&driver);
    qb.table("counters")
        .where_("name", "=", "hits")
        .increment("value", 5)
        .await
        .unwrap();

    let calls = driver.recorded();
    assert_eq!(
        calls[0].0,
        "UPDATE `counters` SET value = value + ? WHERE name = ?"
    );
    assert_eq!(
        calls[0].1,
        vec![SqlValue::Int(5), SqlValue::Text(String::from("hits"))]
    );
}

#[tokio::test]
async fn builder_reuse_after_terminal() {
    let driver = RecordingDriver::new();

    let mut qb = QueryBuilder::new(&driver);
    qb.table("users").where_("id", "=", 1).get().await.unwrap();
    qb.table("posts").get().await.unwrap();

    assert_eq!(
        driver.sql_log(),
        vec![
            "SELECT * FROM `users` WHERE id = ?",
            "SELECT * FROM `posts`"
        ]
    );
}

#[tokio::test]
async fn paginate_counts_and_windows_with_same_filters() {
    let driver = RecordingDriver::new();
    driver.push_rows(vec![row(&[("aggregate", SqlValue::Int(51))])]);
    driver.push_rows(vec![row(&[("id", SqlValue::Int(26))])]);

    let mut qb = QueryBuilder::new(&driver);
    let page = qb
        .table("posts")
        .where_("published", "=", true)
        .paginate(25, 2)
        .await
        .unwrap();

    assert_eq!(page.total, 51);
    assert_eq!(page.per_page, 25);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.last_page, 3);
    assert_eq!(page.rows.len(), 1);

    let calls = driver.recorded();
    assert_eq!(
        calls[0].0,
        "SELECT COUNT(*) AS aggregate FROM `posts` WHERE published = ?"
    );
    assert_eq!(
        calls[1].0,
        "SELECT * FROM `posts` WHERE published = ? LIMIT 25 OFFSET 25"
    );
    assert_eq!(calls[0].1, calls[1].1);
}

#[tokio::test]
async fn every_placeholder_has_a_binding() {
    let driver = RecordingDriver::new();

    let mut qb = QueryBuilder::new(&driver);
    qb.table("orders")
        .join("customers", "customers.id", "=", "orders.customer_id")
        .where_("status", "=", "paid")
        .where_between("total", 10, 500)
        .or_where_group(|g| {
            g.where_("vip", "=", true).where_not_in("region", ["test"]);
        })
        .group_by(&["customers.id"])
        .unwrap()
        .having("COUNT(*)", ">", 2)
        .get()
        .await
        .unwrap();

    let (sql, bindings) = driver.recorded().remove(0);
    let placeholders = sql.chars().filter(|&c| c == '?').count();
    assert_eq!(placeholders, bindings.len());
}
