//! Bulk imports: ordering, failure isolation and laziness.
//!
//! Requirements covered:
//! - Outcomes arrive in input order, one per id
//! - A failing item does not stop the items after it
//! - Nothing is imported ahead of the consumer
//! - Repeated ids in one batch update the product created earlier

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use catalog_bridge_core::ErpId;
use catalog_bridge_integration_tests::{ErpMock, product_row};
use catalog_bridge_sync::{ImportError, ImportOutcome, UpsertAction};
use futures::{StreamExt, pin_mut};

async fn erp_with_products(ids: &[i64]) -> ErpMock {
    let erp = ErpMock::start().await;
    erp.accept_login().await;
    for &id in ids {
        erp.serve_product(id, Some(product_row(id, &format!("Product {id}"), 10.0, None)))
            .await;
    }
    erp
}

// ============================================================================
// Ordering and isolation
// ============================================================================

#[tokio::test]
async fn test_failure_in_the_middle_does_not_stop_the_batch() {
    let erp = erp_with_products(&[11, 33]).await;
    erp.serve_product(22, None).await;
    let sync = erp.sync();

    let mut seen = Vec::new();
    let summary = sync
        .run_bulk_import_to_completion(vec![11, 22, 33], |outcome| {
            seen.push((outcome.position, outcome.erp_id, outcome.result.is_ok()));
        })
        .await
        .unwrap();

    assert_eq!(seen, vec![(0, 11, true), (1, 22, false), (2, 33, true)]);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.failed, 1);
    assert!(!summary.is_success());

    assert_eq!(sync.store().count_linked(ErpId::new(11)).await, 1);
    assert_eq!(sync.store().count_linked(ErpId::new(22)).await, 0);
    assert_eq!(sync.store().count_linked(ErpId::new(33)).await, 1);
}

#[tokio::test]
async fn test_stream_yields_one_outcome_per_id_in_order() {
    let erp = erp_with_products(&[3, 1, 2]).await;
    let sync = erp.sync();

    let outcomes: Vec<ImportOutcome> = sync
        .run_bulk_import(vec![3, 0, 1, 2])
        .await
        .unwrap()
        .collect()
        .await;

    let ids: Vec<i64> = outcomes.iter().map(|o| o.erp_id).collect();
    assert_eq!(ids, vec![3, 0, 1, 2]);
    assert!(matches!(
        outcomes[1].result,
        Err(ImportError::InvalidArgument(0))
    ));
    assert!(outcomes[0].result.is_ok());
    assert!(outcomes[2].result.is_ok());
    assert!(outcomes[3].result.is_ok());
}

#[tokio::test]
async fn test_repeated_id_updates_within_one_batch() {
    let erp = erp_with_products(&[5]).await;
    let sync = erp.sync();

    let mut actions = Vec::new();
    let summary = sync
        .run_bulk_import_to_completion(vec![5, 5], |outcome| {
            if let Ok(imported) = &outcome.result {
                actions.push(imported.action);
            }
        })
        .await
        .unwrap();

    assert_eq!(actions, vec![UpsertAction::Created, UpsertAction::Updated]);
    assert_eq!(summary.total(), 2);
    assert_eq!(sync.store().products().await.len(), 1);
}

#[tokio::test]
async fn test_failed_save_is_reported_and_next_item_continues() {
    let erp = erp_with_products(&[1, 2]).await;
    let sync = erp.sync();
    sync.store().fail_next_saves(1).await;

    let mut results = Vec::new();
    let summary = sync
        .run_bulk_import_to_completion(vec![1, 2], |outcome| {
            results.push(outcome.result.as_ref().map(|_| ()).map_err(ImportError::kind));
        })
        .await
        .unwrap();

    assert!(results[0].is_err());
    assert!(results[1].is_ok());
    assert_eq!(summary.failed, 1);
    assert_eq!(sync.store().count_linked(ErpId::new(1)).await, 0);
    assert_eq!(sync.store().count_linked(ErpId::new(2)).await, 1);
}

// ============================================================================
// Laziness
// ============================================================================

#[tokio::test]
async fn test_nothing_is_imported_before_polling() {
    let erp = erp_with_products(&[1, 2, 3]).await;
    let sync = erp.sync();

    let outcomes = sync
        .run_bulk_import(vec![1, 2, 3])
        .await
        .unwrap();
    drop(outcomes);

    assert_eq!(erp.login_calls().await, 1);
    assert_eq!(erp.object_calls().await, 0);
    assert!(sync.store().products().await.is_empty());
}

#[tokio::test]
async fn test_dropping_the_stream_stops_the_batch() {
    let erp = erp_with_products(&[1, 2, 3]).await;
    let sync = erp.sync();

    {
        let outcomes = sync
            .run_bulk_import(vec![1, 2, 3])
            .await
                .unwrap();
        pin_mut!(outcomes);

        let first = outcomes.next().await.unwrap();
        assert_eq!(first.erp_id, 1);
        assert!(first.result.is_ok());
    }

    assert_eq!(erp.object_calls().await, 1);
    assert_eq!(sync.store().products().await.len(), 1);
}
