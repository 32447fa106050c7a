//! Session-scoped transactions

mod common;

use common::{config, session_expired, MockClient, Reply};
use rivven_bigquery::prelude::*;
use rivven_bigquery::session::SESSION_ID_PROPERTY;

#[tokio::test]
async fn test_begin_then_commit() {
    let client = MockClient::new();
    let mut conn = client.connection(config());
    let ctx = Context::background();

    let tx = conn
        .begin_transaction(&ctx, TxOptions::default())
        .await
        .unwrap();
    tx.commit(&ctx).await.unwrap();

    assert_eq!(
        client.queries(),
        vec!["BEGIN TRANSACTION".to_string(), "COMMIT TRANSACTION".to_string()]
    );
    let requests = client.requests();
    assert!(requests[0].create_session);
    assert_eq!(
        requests[1].connection_property(SESSION_ID_PROPERTY),
        Some("session-1")
    );
}

#[tokio::test]
async fn test_begin_then_rollback() {
    let client = MockClient::new();
    let mut conn = client.connection(config());
    let ctx = Context::background();

    let mut tx = conn
        .begin_transaction(&ctx, TxOptions::default())
        .await
        .unwrap();
    tx.execute(&ctx, "INSERT INTO t VALUES (1)", vec![])
        .await
        .unwrap();
    tx.rollback(&ctx).await.unwrap();

    assert_eq!(
        client.queries(),
        vec![
            "BEGIN TRANSACTION".to_string(),
            "INSERT INTO t VALUES (1)".to_string(),
            "ROLLBACK TRANSACTION".to_string(),
        ]
    );
    assert!(client.requests()[1..].iter().all(|r| !r.create_session));
}

#[tokio::test]
async fn test_isolation_level_rejected_before_any_statement() {
    let client = MockClient::new();
    let mut conn = client.connection(config());
    let ctx = Context::background();

    let err = conn
        .begin_transaction(
            &ctx,
            TxOptions::default().with_isolation(IsolationLevel::Serializable),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedTransactionOption { .. }));
    assert_eq!(client.request_count(), 0);
    assert!(conn.is_valid());
}

#[tokio::test]
async fn test_read_only_rejected_before_any_statement() {
    let client = MockClient::new();
    let mut conn = client.connection(config());

    let err = conn
        .begin_transaction(&Context::background(), TxOptions::default().read_only())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedTransactionOption { .. }));
    assert_eq!(client.request_count(), 0);
}

#[tokio::test]
async fn test_query_inside_transaction() {
    let client = MockClient::new();
    let mut conn = client.connection(config());
    let ctx = Context::background();

    let mut tx = conn
        .begin_transaction(&ctx, TxOptions::default())
        .await
        .unwrap();
    client.push(Reply::Rows {
        schema: vec![FieldSchema::new("n", FieldType::Integer)],
        rows: vec![vec![RawValue::Int64(7)]],
    });
    let mut rows = tx.query(&ctx, "SELECT COUNT(*) AS n FROM t", vec![]).await.unwrap();
    let row = rows.next().await.unwrap().unwrap();
    assert_eq!(row.get_by_name("n"), Some(&ScalarValue::Int64(7)));
    assert_eq!(tx.connection().session_id(), Some("session-1"));
    tx.commit(&ctx).await.unwrap();
}

#[tokio::test]
async fn test_commit_on_broken_session_fails() {
    let client = MockClient::new();
    let mut conn = client.connection(config());
    let ctx = Context::background();

    let tx = conn
        .begin_transaction(&ctx, TxOptions::default())
        .await
        .unwrap();
    client.push(Reply::Fail(session_expired("session-1")));

    let err = tx.commit(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::SessionBroken { .. }));
    assert!(!conn.is_valid());
    assert!(matches!(
        conn.begin_transaction(&ctx, TxOptions::default()).await,
        Err(Error::BadConnection)
    ));
}
