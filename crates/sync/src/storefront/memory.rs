//! In-memory product store.
//!
//! Used by tests and by `cb-cli import --dry-run`. Follows the same contract
//! as [`super::PgProductStore`]: ids are assigned sequentially on insert, the
//! ERP link is only written by `set_external_id`, and lookups by link return
//! the lowest id when several products share one.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::Mutex;

use catalog_bridge_core::{ErpId, StorefrontProduct, StorefrontProductId};

use super::{ProductStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    products: BTreeMap<StorefrontProductId, StorefrontProduct>,
    last_id: i64,
    failing_saves: usize,
    saves: usize,
}

impl MemoryState {
    fn next_id(&mut self) -> StorefrontProductId {
        self.last_id += 1;
        StorefrontProductId::new(self.last_id)
    }
}

/// Product store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    state: Mutex<MemoryState>,
}

impl MemoryProductStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product as-is, including its ERP link, and return its new id.
    ///
    /// Bypasses the normal save path, so it can set up states `save` never
    /// produces (e.g. two products linked to the same ERP id).
    pub async fn seed(&self, mut product: StorefrontProduct) -> StorefrontProductId {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        product.id = Some(id);
        product.updated_at = product.updated_at.or_else(|| Some(Utc::now()));
        state.products.insert(id, product);
        id
    }

    /// Make the next `count` calls to `save` fail with `StoreError::Rejected`.
    pub async fn fail_next_saves(&self, count: usize) {
        self.state.lock().await.failing_saves = count;
    }

    /// All products, ordered by id.
    pub async fn products(&self) -> Vec<StorefrontProduct> {
        self.state.lock().await.products.values().cloned().collect()
    }

    /// Number of products linked to `erp_id`.
    pub async fn count_linked(&self, erp_id: ErpId) -> usize {
        self.state
            .lock()
            .await
            .products
            .values()
            .filter(|p| p.external_id == Some(erp_id))
            .count()
    }

    /// Number of successful saves so far.
    pub async fn save_count(&self) -> usize {
        self.state.lock().await.saves
    }
}

impl ProductStore for MemoryProductStore {
    async fn find_by_external_id(
        &self,
        erp_id: ErpId,
    ) -> Result<Option<StorefrontProduct>, StoreError> {
        let state = self.state.lock().await;
        let mut linked = state
            .products
            .values()
            .filter(|p| p.external_id == Some(erp_id));

        let found = linked.next().cloned();
        if linked.next().is_some() {
            tracing::warn!(%erp_id, "Several storefront products linked to one ERP product, using lowest id");
        }
        Ok(found)
    }

    async fn save(&self, product: &StorefrontProduct) -> Result<StorefrontProductId, StoreError> {
        let mut state = self.state.lock().await;

        if state.failing_saves > 0 {
            state.failing_saves -= 1;
            return Err(StoreError::Rejected("injected save failure".to_string()));
        }

        let id = match product.id {
            Some(id) => {
                let stored = state.products.get(&id).ok_or(StoreError::NotFound(id))?;
                let external_id = stored.external_id;
                state.products.insert(
                    id,
                    StorefrontProduct {
                        id: Some(id),
                        external_id,
                        updated_at: Some(Utc::now()),
                        ..product.clone()
                    },
                );
                id
            }
            None => {
                let id = state.next_id();
                state.products.insert(
                    id,
                    StorefrontProduct {
                        id: Some(id),
                        external_id: None,
                        updated_at: Some(Utc::now()),
                        ..product.clone()
                    },
                );
                id
            }
        };

        state.saves += 1;
        Ok(id)
    }

    async fn set_external_id(
        &self,
        id: StorefrontProductId,
        erp_id: ErpId,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let product = state.products.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        product.external_id = Some(erp_id);
        Ok(())
    }
}
