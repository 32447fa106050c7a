//! Connection strings and the connector

mod common;

use common::MockClient;
use rivven_bigquery::prelude::*;

#[test]
fn test_config_from_str() {
    let config: Config = "bigquery://proj/EU/sales?userAgent=rivven".parse().unwrap();
    assert_eq!(config.project_id, "proj");
    assert_eq!(config.location.as_deref(), Some("EU"));
    assert_eq!(config.dataset.as_deref(), Some("sales"));
    assert_eq!(config.options.user_agent.as_deref(), Some("rivven"));
}

#[test]
fn test_invalid_dsn_fails_before_connecting() {
    let client = MockClient::new();
    let factory = client.factory();

    let err = Connector::from_dsn("mysql://proj/sales", factory.clone()).unwrap_err();
    assert!(matches!(err, Error::InvalidConnectionString { .. }));
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert_eq!(factory.connects(), 0);
}

#[tokio::test]
async fn test_connector_opens_independent_connections() {
    let client = MockClient::new();
    let factory = client.factory();
    let connector = Connector::from_dsn("bigquery://proj/sales", factory.clone()).unwrap();
    let ctx = Context::background();

    let mut first = connector.connect(&ctx).await.unwrap();
    let mut second = connector.connect(&ctx).await.unwrap();
    assert_eq!(factory.connects(), 2);
    assert_eq!(first.config().dataset.as_deref(), Some("sales"));

    first.execute(&ctx, "SELECT 1", vec![]).await.unwrap();
    second.execute(&ctx, "SELECT 1", vec![]).await.unwrap();
    assert_eq!(first.session_id(), Some("session-1"));
    assert_eq!(second.session_id(), Some("session-2"));

    first.close().await.unwrap();
    assert!(second.is_valid());
    second.close().await.unwrap();
    assert_eq!(client.close_calls(), 2);
}

#[test]
fn test_connector_debug_hides_credentials() {
    let client = MockClient::new();
    let connector =
        Connector::from_dsn("bigquery://proj?apiKey=top-secret", client.factory()).unwrap();
    let debug = format!("{connector:?}");
    assert!(debug.contains("proj"));
    assert!(!debug.contains("top-secret"));
}
