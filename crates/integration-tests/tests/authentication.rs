//! Behaviour when the ERP rejects the configured credentials.
//!
//! A failed login, whether rejected or unreachable, is remembered for the
//! session: every operation fails with an authentication error and no model
//! call is ever sent.

#![allow(clippy::unwrap_used)]

use catalog_bridge_integration_tests::{DATABASE, ErpMock, LOGIN};
use catalog_bridge_sync::erp::ErpError;
use catalog_bridge_sync::{ImportError, ImportErrorKind};

#[tokio::test]
async fn test_rejected_login_blocks_listing() {
    let erp = ErpMock::start().await;
    erp.reject_login().await;
    let sync = erp.sync();

    let result = sync.list_erp_products(None).await;
    assert!(matches!(
        result,
        Err(ErpError::NotAuthenticated { ref login, ref database })
            if login == LOGIN && database == DATABASE
    ));

    let result = sync.list_erp_modules(Some(5)).await;
    assert!(matches!(result, Err(ErpError::NotAuthenticated { .. })));

    assert_eq!(erp.object_calls().await, 0);
}

#[tokio::test]
async fn test_rejected_login_blocks_import() {
    let erp = ErpMock::start().await;
    erp.reject_login().await;
    let sync = erp.sync();

    let error = sync.import_product(42).await.unwrap_err();
    assert_eq!(error.kind(), ImportErrorKind::Authentication);

    // The rejection is cached; the login mock expects a single attempt
    let error = sync.import_product(43).await.unwrap_err();
    assert!(matches!(error, ImportError::Authentication { .. }));

    assert_eq!(erp.login_calls().await, 1);
    assert_eq!(erp.object_calls().await, 0);
    assert!(sync.store().products().await.is_empty());
}

#[tokio::test]
async fn test_rejected_login_fails_bulk_import_up_front() {
    let erp = ErpMock::start().await;
    erp.reject_login().await;
    let sync = erp.sync();

    let error = sync.run_bulk_import(vec![1, 2, 3]).await.err();
    assert!(matches!(error, Some(ImportError::Authentication { .. })));

    let mut called = false;
    let result = sync
        .run_bulk_import_to_completion(vec![1, 2, 3], |_| called = true)
        .await;
    assert!(matches!(result, Err(ImportError::Authentication { .. })));
    assert!(!called);

    assert_eq!(erp.object_calls().await, 0);
}

#[tokio::test]
async fn test_unreachable_login_is_an_authentication_failure() {
    let erp = ErpMock::start().await;
    erp.fail_login().await;
    let sync = erp.sync();

    let first = sync.import_product(42).await.unwrap_err();
    let second = sync.import_product(43).await.unwrap_err();

    assert_eq!(first.kind(), ImportErrorKind::Authentication);
    assert_eq!(second.kind(), ImportErrorKind::Authentication);
    assert!(matches!(
        sync.list_erp_products(None).await,
        Err(ErpError::NotAuthenticated { .. })
    ));

    assert_eq!(erp.login_calls().await, 1);
    assert_eq!(erp.object_calls().await, 0);
}

#[tokio::test]
async fn test_listing_after_successful_login() {
    let erp = ErpMock::start().await;
    erp.accept_login().await;
    erp.serve_listing(serde_json::json!([
        {"id": 1, "name": "Widget", "list_price": 19.99, "default_code": "W-1"},
        {"id": 2, "name": "Gadget", "list_price": 5.0, "default_code": false}
    ]))
    .await;
    let sync = erp.sync();

    let products = sync.list_erp_products(Some(2)).await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products.first().unwrap().sku.as_deref(), Some("W-1"));
    assert_eq!(products.get(1).unwrap().sku, None);
    assert_eq!(erp.login_calls().await, 1);
}
