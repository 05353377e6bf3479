//! Sequential bulk import with per-item progress.
//!
//! Items are imported one at a time in the order given. Each outcome is yielded
//! before the next item starts, so a consumer can render progress as it goes.
//! A failed item is reported and the batch moves on; nothing is retried.

use futures::{Stream, StreamExt};
use serde::Serialize;
use tracing::instrument;

use crate::error::ImportError;
use crate::storefront::ProductStore;
use crate::upsert::{ImportedProduct, ProductUpsertService, UpsertAction};

/// Outcome of one item in a batch.
#[derive(Debug)]
pub struct ImportOutcome {
    /// Zero-based position in the submitted batch.
    pub position: usize,
    /// ERP id as submitted.
    pub erp_id: i64,
    pub result: Result<ImportedProduct, ImportError>,
}

/// Per-batch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &ImportOutcome) {
        match &outcome.result {
            Ok(imported) => match imported.action {
                UpsertAction::Created => self.created += 1,
                UpsertAction::Updated => self.updated += 1,
            },
            Err(_) => self.failed += 1,
        }
    }

    /// Number of items processed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.created + self.updated + self.failed
    }

    /// Whether every item succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Drives [`ProductUpsertService::import_product`] over a list of ids.
#[derive(Debug)]
pub struct BulkImportOrchestrator<'a, S> {
    upsert: &'a ProductUpsertService<S>,
}

impl<'a, S: ProductStore + 'a> BulkImportOrchestrator<'a, S> {
    /// Create an orchestrator over `upsert`.
    #[must_use]
    pub const fn new(upsert: &'a ProductUpsertService<S>) -> Self {
        Self { upsert }
    }

    /// Start a batch.
    ///
    /// Takes `self` by value so the returned stream borrows only the service.
    ///
    /// Authentication is checked before the stream is returned. The stream is
    /// lazy: an item is imported only when the consumer polls for it. Dropping
    /// the stream stops the batch after the current item.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Authentication` if the ERP cannot be
    /// authenticated against; no item is attempted in that case.
    #[instrument(skip(self, erp_ids), fields(count = erp_ids.len()))]
    pub async fn run(
        self,
        erp_ids: Vec<i64>,
    ) -> Result<impl Stream<Item = ImportOutcome> + 'a, ImportError> {
        self.upsert.ensure_authenticated().await?;

        let upsert = self.upsert;
        Ok(async_stream::stream! {
            for (position, erp_id) in erp_ids.into_iter().enumerate() {
                let result = upsert.import_product(erp_id).await;
                if let Err(e) = &result {
                    tracing::warn!(position, erp_id, error = %e, "Import failed");
                }
                yield ImportOutcome { position, erp_id, result };
            }
        })
    }

    /// Run a batch to the end, calling `on_outcome` after each item.
    ///
    /// # Errors
    ///
    /// Same as [`BulkImportOrchestrator::run`]. Per-item failures are counted
    /// in the summary, not returned.
    pub async fn run_to_completion<F>(
        self,
        erp_ids: Vec<i64>,
        mut on_outcome: F,
    ) -> Result<BatchSummary, ImportError>
    where
        F: FnMut(&ImportOutcome),
    {
        let outcomes = self.run(erp_ids).await?;
        futures::pin_mut!(outcomes);

        let mut summary = BatchSummary::default();
        while let Some(outcome) = outcomes.next().await {
            summary.record(&outcome);
            on_outcome(&outcome);
        }

        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            failed = summary.failed,
            "Bulk import finished"
        );
        Ok(summary)
    }
}
