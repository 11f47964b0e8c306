use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use taller_ledger_engine::{
    db_types::{MovementKind, NewCashSession, SessionStatus, TenantId},
    CashRegisterApi,
    CashRegisterError,
    SqliteDatabase,
};
use tlr_common::Money;
use tokio::runtime::Runtime;

use crate::support::prepare_env::{prepare_test_env, random_db_path};

mod support;

async fn setup() -> (String, CashRegisterApi<SqliteDatabase>) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    (url, CashRegisterApi::new(db))
}

#[test]
fn one_open_session_per_operator() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        let tenant = TenantId::from("shop-a");
        let session =
            api.open_session(NewCashSession::new(tenant.clone(), "carla", Money::from_whole(100))).await.unwrap();
        assert!(session.is_open());
        assert_eq!(session.opening_balance, Money::from_whole(100));

        // Carla cannot open a second drawer in the same shop
        let err =
            api.open_session(NewCashSession::new(tenant.clone(), "carla", Money::from(0))).await.unwrap_err();
        assert!(matches!(err, CashRegisterError::SessionAlreadyOpen(ref op) if op == "carla"), "Got {err} instead");

        // A different operator in the same shop is fine, and so is Carla in a different shop
        api.open_session(NewCashSession::new(tenant.clone(), "miguel", Money::from(0))).await.unwrap();
        api.open_session(NewCashSession::new("shop-b", "carla", Money::from(0))).await.unwrap();
        Sqlite::drop_database(&url).await.unwrap();
    });
}

#[test]
fn racing_opens_admit_exactly_one_session() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        info!("🚀️ Racing two session opens for the same operator");
        let mut handles = Vec::new();
        for _ in 0..2 {
            let api = CashRegisterApi::new(api.db().clone());
            handles.push(tokio::spawn(async move {
                api.open_session(NewCashSession::new("shop-a", "carla", Money::from(0))).await
            }));
        }
        let mut opened = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => opened += 1,
                Err(CashRegisterError::SessionAlreadyOpen(_)) => {},
                Err(e) => panic!("Unexpected error: {e}"),
            }
        }
        assert_eq!(opened, 1, "Exactly one of the racing opens must win");
        Sqlite::drop_database(&url).await.unwrap();
    });
}

#[test]
fn session_lifecycle() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        let tenant = TenantId::from("shop-a");
        let session =
            api.open_session(NewCashSession::new(tenant.clone(), "carla", Money::from_whole(100))).await.unwrap();

        api.record_movement(&tenant, session.id, MovementKind::Inflow, Money::from_whole(25), None).await.unwrap();
        api.record_movement(
            &tenant,
            session.id,
            MovementKind::Outflow,
            Money::from_whole(10),
            Some("Stamp money".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(api.balance(&tenant, session.id).await.unwrap(), Money::from_whole(115));

        // The counted balance is stored verbatim, even when it disagrees with the expected one
        let closed = api.close_session(&tenant, session.id, Money::from_whole(114)).await.unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);
        assert_eq!(closed.closing_balance, Some(Money::from_whole(114)));
        assert!(closed.closed_at.is_some());

        // No more movements and no second close once the drawer is shut
        let err = api
            .record_movement(&tenant, session.id, MovementKind::Inflow, Money::from_whole(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CashRegisterError::SessionNotOpen(id) if id == session.id), "Got {err} instead");
        let err = api.close_session(&tenant, session.id, Money::from(0)).await.unwrap_err();
        assert!(matches!(err, CashRegisterError::SessionNotOpen(_)), "Got {err} instead");

        // Closing frees the operator to open a fresh drawer
        let next = api.open_session(NewCashSession::new(tenant.clone(), "carla", Money::from_whole(114))).await;
        assert!(next.is_ok());
        Sqlite::drop_database(&url).await.unwrap();
    });
}

#[test]
fn movements_require_an_existing_open_session() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        let tenant = TenantId::from("shop-a");
        let err = api
            .record_movement(&tenant, 999, MovementKind::Inflow, Money::from_whole(5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CashRegisterError::SessionNotFound(999)), "Got {err} instead");

        // A session belonging to another tenant is invisible
        let session = api.open_session(NewCashSession::new("shop-b", "carla", Money::from(0))).await.unwrap();
        let err = api
            .record_movement(&tenant, session.id, MovementKind::Inflow, Money::from_whole(5), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CashRegisterError::SessionNotFound(_)), "Got {err} instead");
        Sqlite::drop_database(&url).await.unwrap();
    });
}

#[test]
fn cash_register_requests_are_validated() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let (url, api) = setup().await;
        let tenant = TenantId::from("shop-a");
        let err =
            api.open_session(NewCashSession::new(tenant.clone(), " ", Money::from(0))).await.unwrap_err();
        assert!(matches!(err, CashRegisterError::ValidationError(_)), "Got {err} instead");
        let err = api
            .open_session(NewCashSession::new(tenant.clone(), "carla", Money::from(-1)))
            .await
            .unwrap_err();
        assert!(matches!(err, CashRegisterError::ValidationError(_)), "Got {err} instead");

        let session = api.open_session(NewCashSession::new(tenant.clone(), "carla", Money::from(0))).await.unwrap();
        let err = api
            .record_movement(&tenant, session.id, MovementKind::Inflow, Money::from(0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CashRegisterError::ValidationError(_)), "Got {err} instead");
        let err = api
            .record_movement(&tenant, session.id, MovementKind::Outflow, Money::from(-500), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CashRegisterError::ValidationError(_)), "Got {err} instead");
        let err = api.close_session(&tenant, session.id, Money::from(-100)).await.unwrap_err();
        assert!(matches!(err, CashRegisterError::ValidationError(_)), "Got {err} instead");

        // The drawer is untouched by the rejected requests
        assert_eq!(api.balance(&tenant, session.id).await.unwrap(), Money::from(0));
        assert!(api.movements(&tenant, session.id).await.unwrap().is_empty());
        Sqlite::drop_database(&url).await.unwrap();
    });
}
