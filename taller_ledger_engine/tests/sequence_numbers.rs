use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use taller_ledger_engine::{
    db_types::{DocumentType, SequenceKey},
    LedgerDatabase,
    SequenceApi,
    SequenceError,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

use crate::support::prepare_env::{prepare_test_env, random_db_path};

mod support;

const NUM_ALLOCATIONS: usize = 20;

async fn setup() -> (String, SequenceApi<SqliteDatabase>) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    (url, SequenceApi::new(db))
}

#[test]
fn burst_allocations_are_distinct_and_contiguous() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        let key = SequenceKey::new("shop-a", DocumentType::Invoice, "001", "001");
        info!("🚀️ Firing {NUM_ALLOCATIONS} concurrent allocations");
        let mut handles = Vec::with_capacity(NUM_ALLOCATIONS);
        for _ in 0..NUM_ALLOCATIONS {
            let api = SequenceApi::new(api.db().clone());
            let key = key.clone();
            handles.push(tokio::spawn(async move { api.allocate(&key, None).await }));
        }
        let mut values = Vec::with_capacity(NUM_ALLOCATIONS);
        for handle in handles {
            let allocated = handle.await.unwrap().expect("Allocation failed");
            values.push(allocated.value);
        }
        values.sort_unstable();
        let expected = (1..=NUM_ALLOCATIONS as i64).collect::<Vec<i64>>();
        assert_eq!(values, expected, "Concurrent allocations must form one contiguous run without duplicates");
        Sqlite::drop_database(&url).await.unwrap();
    });
}

#[test]
fn series_are_independent() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        let invoices_a = SequenceKey::new("shop-a", DocumentType::Invoice, "001", "001");
        let sales_a = SequenceKey::new("shop-a", DocumentType::Sale, "001", "001");
        let invoices_b = SequenceKey::new("shop-b", DocumentType::Invoice, "001", "001");
        let other_point = SequenceKey::new("shop-a", DocumentType::Invoice, "001", "002");

        for _ in 0..3 {
            api.allocate(&invoices_a, None).await.unwrap();
        }
        let sale = api.allocate(&sales_a, None).await.unwrap();
        let foreign = api.allocate(&invoices_b, None).await.unwrap();
        let side_point = api.allocate(&other_point, None).await.unwrap();
        let next_invoice = api.allocate(&invoices_a, None).await.unwrap();

        // Each series counts on its own; neighbours start at 1 regardless of the invoice series
        assert_eq!(sale.value, 1);
        assert_eq!(foreign.value, 1);
        assert_eq!(side_point.value, 1);
        assert_eq!(next_invoice.value, 4);
        Sqlite::drop_database(&url).await.unwrap();
    });
}

#[test]
fn formatted_numbers() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        let key = SequenceKey::new("shop-a", DocumentType::Sale, "001", "001");
        let fiscal = api.allocate(&key, None).await.unwrap();
        assert_eq!(fiscal.value, 1);
        assert_eq!(fiscal.formatted, "001-001-000000001");
        // The prefix changes the rendering, not the counter
        let internal = api.allocate(&key, Some("VTA")).await.unwrap();
        assert_eq!(internal.value, 2);
        assert_eq!(internal.formatted, "VTA-001-000000002");
        Sqlite::drop_database(&url).await.unwrap();
    });
}

#[test]
fn values_survive_a_restart() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        let key = SequenceKey::new("shop-a", DocumentType::CreditNote, "002", "001");
        for _ in 0..3 {
            api.allocate(&key, None).await.unwrap();
        }
        let mut db = api.db().clone();
        drop(api);
        db.close().await.expect("Error closing database");
        info!("🚀️ Database closed. Reopening {url}");

        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error reopening database");
        let api = SequenceApi::new(db);
        assert_eq!(api.current_value(&key).await.unwrap(), Some(3));
        let next = api.allocate(&key, None).await.unwrap();
        assert_eq!(next.value, 4, "The series must pick up where it left off after a restart");
        Sqlite::drop_database(&url).await.unwrap();
    });
}

#[test]
fn allocation_requests_are_validated() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        let key = SequenceKey::new("shop-a", DocumentType::Invoice, "", "001");
        let err = api.allocate(&key, None).await.unwrap_err();
        assert!(matches!(err, SequenceError::ValidationError(_)), "Got {err} instead");
        let key = SequenceKey::new("shop-a", DocumentType::Invoice, "001", "001");
        let err = api.allocate(&key, Some("  ")).await.unwrap_err();
        assert!(matches!(err, SequenceError::ValidationError(_)), "Got {err} instead");
        // Nothing was created for the rejected requests
        assert_eq!(api.current_value(&key).await.unwrap(), None);
        Sqlite::drop_database(&url).await.unwrap();
    });
}
