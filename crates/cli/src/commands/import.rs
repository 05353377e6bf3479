//! Product import command.
//!
//! # Usage
//!
//! ```bash
//! # Import specific ERP products
//! cb-cli import 42 43 44
//!
//! # Import everything `cb-cli products` would list
//! cb-cli import --all-listed --limit 100
//!
//! # Exercise the ERP side without writing to the storefront
//! cb-cli import 42 --dry-run
//! ```
//!
//! Items are imported one at a time. Each item prints a progress line as soon
//! as it finishes; the command exits non-zero if any item failed.
//!
//! # Environment Variables
//!
//! - `ERP_URL`, `ERP_DATABASE`, `ERP_LOGIN`, `ERP_API_KEY` - ERP connection
//! - `STOREFRONT_DATABASE_URL` - storefront database (not needed with `--dry-run`)

use catalog_bridge_sync::storefront::{
    MemoryProductStore, PgProductStore, ProductStore, create_pool,
};
use catalog_bridge_sync::{BatchSummary, CatalogSync, ImportError, ImportOutcome, SyncConfig};

use super::{AUTH_FAILED_HINT, describe_erp_error};

/// Which ERP products to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Explicit ids, in order.
    Ids(Vec<i64>),
    /// Every product the ERP listing returns.
    AllListed { limit: Option<u32> },
}

/// Run an import.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the ERP rejects the
/// credentials, or any item fails to import.
pub async fn run(selection: Selection, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = SyncConfig::from_env()?;

    if dry_run {
        tracing::info!("Dry run: importing into an in-memory store");
        let sync = CatalogSync::connect(config.erp, MemoryProductStore::new())?;
        return import_with(&sync, selection).await;
    }

    let pool = create_pool(config.storefront_database_url()?).await?;
    tracing::info!("Connected to storefront database");

    let sync = CatalogSync::connect(config.erp, PgProductStore::new(pool))?;
    import_with(&sync, selection).await
}

#[allow(clippy::print_stdout)]
async fn import_with<S: ProductStore>(
    sync: &CatalogSync<S>,
    selection: Selection,
) -> Result<(), Box<dyn std::error::Error>> {
    let erp_ids: Vec<i64> = match selection {
        Selection::Ids(ids) => ids,
        Selection::AllListed { limit } => {
            let products = sync
                .list_erp_products(limit)
                .await
                .map_err(|e| describe_erp_error(&e))?;
            if products.is_empty() {
                println!("No products found in the ERP.");
                return Ok(());
            }
            products.iter().map(|p| p.erp_id.as_i64()).collect()
        }
    };

    let total = erp_ids.len();
    let summary = sync
        .run_bulk_import_to_completion(erp_ids, |outcome| {
            println!("{}", progress_line(outcome, total));
        })
        .await
        .map_err(|e| match e {
            ImportError::Authentication { .. } => format!("{AUTH_FAILED_HINT} ({e})"),
            other => other.to_string(),
        })?;

    println!("{}", summary_line(&summary));

    if summary.is_success() {
        Ok(())
    } else {
        Err(format!("{} of {} imports failed", summary.failed, summary.total()).into())
    }
}

fn progress_line(outcome: &ImportOutcome, total: usize) -> String {
    let step = outcome.position + 1;
    match &outcome.result {
        Ok(imported) => format!(
            "✅ [{step}/{total}] ERP product {} → storefront product {} ({})",
            outcome.erp_id, imported.storefront_id, imported.action
        ),
        Err(e) => format!(
            "❌ [{step}/{total}] ERP product {}: {e} [{}]",
            outcome.erp_id,
            e.kind()
        ),
    }
}

fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "Done: {} created, {} updated, {} failed",
        summary.created, summary.updated, summary.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_bridge_core::{ErpId, StorefrontProductId};
    use catalog_bridge_sync::{ImportedProduct, UpsertAction};

    #[test]
    fn test_progress_line_success() {
        let outcome = ImportOutcome {
            position: 0,
            erp_id: 42,
            result: Ok(ImportedProduct {
                erp_id: ErpId::new(42),
                storefront_id: StorefrontProductId::new(7),
                action: UpsertAction::Created,
            }),
        };
        assert_eq!(
            progress_line(&outcome, 3),
            "✅ [1/3] ERP product 42 → storefront product 7 (created)"
        );
    }

    #[test]
    fn test_progress_line_failure() {
        let outcome = ImportOutcome {
            position: 1,
            erp_id: 404,
            result: Err(ImportError::NotFound(ErpId::new(404))),
        };
        assert_eq!(
            progress_line(&outcome, 3),
            "❌ [2/3] ERP product 404: ERP product 404 not found [not_found]"
        );
    }

    #[test]
    fn test_summary_line() {
        let summary = BatchSummary {
            created: 2,
            updated: 1,
            failed: 0,
        };
        assert_eq!(summary_line(&summary), "Done: 2 created, 1 updated, 0 failed");
    }
}
