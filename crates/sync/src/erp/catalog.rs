//! Catalog queries against the ERP.
//!
//! The ERP encodes "no value" in text fields as `false` rather than `null`,
//! so every optional text field goes through [`text_or_none`].

use catalog_bridge_core::{ErpId, ErpModuleRecord, ErpProductRecord, ModuleState, Price};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};
use tracing::instrument;

use super::{ErpClient, ErpError};

const PRODUCT_MODEL: &str = "product.template";
const MODULE_MODEL: &str = "ir.module.module";

const LISTING_FIELDS: [&str; 4] = ["id", "name", "list_price", "default_code"];
/// `read` always returns `id`, so it is not requested.
const DETAIL_FIELDS: [&str; 3] = ["name", "list_price", "description_sale"];
const MODULE_FIELDS: [&str; 4] = ["name", "shortdesc", "author", "state"];

/// A `product.template` row. Unrequested fields default to `None`.
#[derive(Debug, Deserialize)]
struct ProductRow {
    id: i64,
    #[serde(default, deserialize_with = "text_or_none")]
    name: Option<String>,
    list_price: f64,
    #[serde(default, deserialize_with = "text_or_none")]
    default_code: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    description_sale: Option<String>,
}

impl TryFrom<ProductRow> for ErpProductRecord {
    type Error = ErpError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::from_erp_float(row.list_price).map_err(|e| {
            ErpError::MalformedResponse(format!("product {}: {e}", row.id))
        })?;

        Ok(Self {
            erp_id: ErpId::new(row.id),
            name: row.name.unwrap_or_default(),
            price,
            sku: row.default_code,
            description: row.description_sale,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ModuleRow {
    #[serde(deserialize_with = "text_or_none")]
    name: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    shortdesc: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    author: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    state: Option<String>,
}

impl From<ModuleRow> for ErpModuleRecord {
    fn from(row: ModuleRow) -> Self {
        Self {
            name: row.name.unwrap_or_default(),
            short_description: row.shortdesc,
            author: row.author,
            state: row
                .state
                .map_or(ModuleState::Unknown, ModuleState::from),
        }
    }
}

/// Map ERP text values to `Option<String>`: `false`, `null` and `""` are `None`.
fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn query_kwargs(fields: &[&str], limit: Option<u32>) -> Map<String, Value> {
    let mut kwargs = Map::new();
    kwargs.insert("fields".to_string(), json!(fields));
    if let Some(limit) = limit {
        kwargs.insert("limit".to_string(), json!(limit));
    }
    kwargs
}

/// Read-only catalog queries.
#[derive(Debug, Clone)]
pub struct CatalogReader {
    client: ErpClient,
}

impl CatalogReader {
    /// Wrap an authenticated client.
    #[must_use]
    pub const fn new(client: ErpClient) -> Self {
        Self { client }
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &ErpClient {
        &self.client
    }

    /// List product templates (id, name, list price, internal reference).
    ///
    /// No domain filter is applied; the ERP's default ordering is kept.
    ///
    /// # Errors
    ///
    /// Returns `ErpError` on authentication failure, fault, transport error,
    /// or a row that cannot be decoded.
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: u32) -> Result<Vec<ErpProductRecord>, ErpError> {
        let rows: Vec<ProductRow> = self
            .client
            .call_as(
                PRODUCT_MODEL,
                "search_read",
                vec![json!([])],
                query_kwargs(&LISTING_FIELDS, Some(limit)),
            )
            .await?;

        tracing::debug!(count = rows.len(), "Listed ERP products");
        rows.into_iter().map(ErpProductRecord::try_from).collect()
    }

    /// List installed modules (technical name, short description, author, state).
    ///
    /// # Errors
    ///
    /// Returns `ErpError` on authentication failure, fault, or transport error.
    #[instrument(skip(self))]
    pub async fn list_modules(&self, limit: u32) -> Result<Vec<ErpModuleRecord>, ErpError> {
        let rows: Vec<ModuleRow> = self
            .client
            .call_as(
                MODULE_MODEL,
                "search_read",
                vec![json!([["state", "=", "installed"]])],
                query_kwargs(&MODULE_FIELDS, Some(limit)),
            )
            .await?;

        tracing::debug!(count = rows.len(), "Listed ERP modules");
        Ok(rows.into_iter().map(ErpModuleRecord::from).collect())
    }

    /// Read one product template with its sales description.
    ///
    /// Returns `Ok(None)` if no record with that id exists, whether the ERP
    /// answers with no rows or raises `MissingError`.
    ///
    /// # Errors
    ///
    /// Returns `ErpError` on authentication failure, any other fault, transport
    /// error, or a row that cannot be decoded.
    #[instrument(skip(self), fields(erp_id = %erp_id))]
    pub async fn read_product(
        &self,
        erp_id: ErpId,
    ) -> Result<Option<ErpProductRecord>, ErpError> {
        let rows: Vec<ProductRow> = match self
            .client
            .call_as(
                PRODUCT_MODEL,
                "read",
                vec![json!([erp_id.as_i64()])],
                query_kwargs(&DETAIL_FIELDS, None),
            )
            .await
        {
            Ok(rows) => rows,
            Err(ErpError::Fault(fault)) if fault.is_missing_record() => {
                tracing::debug!("ERP product does not exist");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        rows.into_iter()
            .find(|row| row.id == erp_id.as_i64())
            .map(ErpProductRecord::try_from)
            .transpose()
    }
}
