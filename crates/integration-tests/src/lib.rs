//! Integration tests for Catalog Bridge.
//!
//! # Running Tests
//!
//! ```bash
//! # ERP and in-memory storefront tests (no external services)
//! cargo test -p catalog-bridge-integration-tests
//!
//! # PostgreSQL store tests
//! STOREFRONT_DATABASE_URL=postgres://localhost/catalog_bridge_test \
//!     cargo test -p catalog-bridge-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `import_product` - Single-product import against a mock ERP
//! - `bulk_import` - Ordering, failure isolation and laziness of bulk imports
//! - `authentication` - Behaviour when the ERP rejects the credentials
//! - `pg_store` - `PgProductStore` against a real database (ignored by default)
//!
//! [`ErpMock`] stands in for the ERP: a `wiremock` server that speaks the
//! JSON-RPC envelope and records every request.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use catalog_bridge_sync::storefront::MemoryProductStore;
use catalog_bridge_sync::{CatalogSync, ErpConfig};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// ERP database used by every mock.
pub const DATABASE: &str = "acme_prod";
/// ERP login used by every mock.
pub const LOGIN: &str = "sync-bot@acme.io";
/// ERP API key used by every mock.
pub const API_KEY: &str = "9f2c7a41e0b86d53c1fa7e29b4d0586c3e71a9f2";
/// uid returned by a successful login.
pub const UID: i64 = 7;

/// A mock ERP endpoint.
pub struct ErpMock {
    pub server: MockServer,
}

impl ErpMock {
    /// Start an ERP mock with no routes.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Configuration pointing at this mock.
    #[must_use]
    pub fn config(&self) -> ErpConfig {
        ErpConfig::new(
            &format!("{}/jsonrpc", self.server.uri()),
            DATABASE,
            LOGIN,
            SecretString::from(API_KEY),
        )
        .unwrap()
    }

    /// A sync service against this mock with an empty in-memory store.
    #[must_use]
    pub fn sync(&self) -> CatalogSync<MemoryProductStore> {
        CatalogSync::connect(self.config(), MemoryProductStore::new()).unwrap()
    }

    /// Accept the login exactly once; later attempts would be a caching bug.
    pub async fn accept_login(&self) {
        self.mount_login(ResponseTemplate::new(200).set_body_json(json!({"result": UID})))
            .await;
    }

    /// Reject the login (the ERP answers `false`) exactly once.
    pub async fn reject_login(&self) {
        self.mount_login(ResponseTemplate::new(200).set_body_json(json!({"result": false})))
            .await;
    }

    /// Answer the login with `503 Service Unavailable` exactly once.
    pub async fn fail_login(&self) {
        self.mount_login(ResponseTemplate::new(503)).await;
    }

    async fn mount_login(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "params": {
                    "service": "common",
                    "method": "authenticate",
                    "args": [DATABASE, LOGIN, API_KEY, {}]
                }
            })))
            .respond_with(response)
            .expect(1)
            .named("common.authenticate")
            .mount(&self.server)
            .await;
    }

    /// Answer `product.template.read` for `erp_id` with `row`.
    ///
    /// Pass `None` to answer with an empty result (no such product).
    pub async fn serve_product(&self, erp_id: i64, row: Option<Value>) {
        let rows = row.map_or_else(Vec::new, |row| vec![row]);
        Mock::given(method("POST"))
            .and(body_partial_json(object_call("product.template", "read", json!([erp_id]))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": rows})))
            .named("product.template.read")
            .mount(&self.server)
            .await;
    }

    /// Answer `product.template.read` for `erp_id` the way the ERP does for a
    /// deleted or never-created record: a `MissingError` fault.
    pub async fn serve_missing_product(&self, erp_id: i64) {
        Mock::given(method("POST"))
            .and(body_partial_json(object_call("product.template", "read", json!([erp_id]))))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "error": {
                    "code": 200,
                    "message": "Odoo Server Error",
                    "data": {
                        "name": "odoo.exceptions.MissingError",
                        "message": "Record does not exist or has been deleted.",
                        "arguments": ["Record does not exist or has been deleted."]
                    }
                }
            })))
            .named("product.template.read (missing)")
            .mount(&self.server)
            .await;
    }

    /// Answer `product.template.search_read` with `rows`.
    pub async fn serve_listing(&self, rows: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(object_call(
                "product.template",
                "search_read",
                json!([]),
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": rows})))
            .named("product.template.search_read")
            .mount(&self.server)
            .await;
    }

    /// Remove every route and forget recorded requests.
    pub async fn reset(&self) {
        self.server.reset().await;
    }

    /// Number of `object.execute_kw` requests received so far.
    pub async fn object_calls(&self) -> usize {
        self.requests_for("object").await
    }

    /// Number of `common.authenticate` requests received so far.
    pub async fn login_calls(&self) -> usize {
        self.requests_for("common").await
    }

    async fn requests_for(&self, service: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
            .filter(|body| body["params"]["service"] == service)
            .count()
    }
}

/// Partial body of an `execute_kw` call for `model.method(first_arg, ...)`.
fn object_call(model: &str, method_name: &str, first_arg: Value) -> Value {
    json!({
        "params": {
            "service": "object",
            "method": "execute_kw",
            "args": [DATABASE, UID, API_KEY, model, method_name, [first_arg]]
        }
    })
}

/// A `product.template` row as the ERP returns it from `read`.
#[must_use]
pub fn product_row(erp_id: i64, name: &str, list_price: f64, description: Option<&str>) -> Value {
    json!({
        "id": erp_id,
        "name": name,
        "list_price": list_price,
        "description_sale": description.map_or(Value::Bool(false), Value::from),
    })
}
