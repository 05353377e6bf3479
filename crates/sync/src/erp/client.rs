//! Authenticated ERP client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::instrument;

use super::{AuthCache, AuthSession, ErpError, RpcTransport};
use crate::config::ErpConfig;

/// ERP JSON-RPC client.
///
/// Cheap to clone; clones share the transport and the authentication cache,
/// so a process authenticates at most once no matter how many components
/// hold a client.
#[derive(Clone)]
pub struct ErpClient {
    inner: Arc<ErpClientInner>,
}

struct ErpClientInner {
    config: ErpConfig,
    transport: RpcTransport,
    auth: AuthCache,
}

impl std::fmt::Debug for ErpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErpClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ErpClient {
    /// Create a client for the configured endpoint.
    ///
    /// No network traffic happens until the first call.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::Http` if the HTTP client cannot be built.
    pub fn new(config: ErpConfig) -> Result<Self, ErpError> {
        Self::with_auth_cache(config, AuthCache::new())
    }

    /// Create a client around an existing authentication cache.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::Http` if the HTTP client cannot be built.
    pub fn with_auth_cache(config: ErpConfig, auth: AuthCache) -> Result<Self, ErpError> {
        let transport = RpcTransport::new(config.url().clone(), config.timeout())?;

        Ok(Self {
            inner: Arc::new(ErpClientInner {
                config,
                transport,
                auth,
            }),
        })
    }

    /// The configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &ErpConfig {
        &self.inner.config
    }

    /// Authenticate (or reuse the cached outcome) and return the session.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::NotAuthenticated` if authentication failed, now or
    /// earlier in this process. An unreachable ERP counts as a failure.
    #[instrument(skip(self))]
    pub async fn session(&self) -> Result<AuthSession, ErpError> {
        let session = self
            .inner
            .auth
            .get_or_authenticate(&self.inner.transport, &self.inner.config)
            .await;

        if session.is_authenticated() {
            Ok(session)
        } else {
            Err(ErpError::NotAuthenticated {
                login: self.inner.config.login().to_string(),
                database: self.inner.config.database().to_string(),
            })
        }
    }

    /// Call `model.method(*args, **kwargs)` as the authenticated user.
    ///
    /// # Errors
    ///
    /// - `ErpError::NotAuthenticated` if authentication failed; no model call is made
    /// - `ErpError::Fault` if the ERP rejected the call
    /// - transport errors otherwise
    #[instrument(skip(self, args, kwargs), fields(model = %model, method = %method))]
    pub async fn call(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, ErpError> {
        let session = self.session().await?;

        self.inner
            .transport
            .execute_kw(
                self.inner.config.database(),
                session.uid(),
                self.inner.config.api_key(),
                model,
                method,
                args,
                kwargs,
            )
            .await
    }

    /// Like [`ErpClient::call`], deserializing the result into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`ErpClient::call`], plus `ErpError::Parse` if the result does
    /// not match `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<T, ErpError> {
        let result = self.call(model, method, args, kwargs).await?;
        Ok(serde_json::from_value(result)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ErpClient {
        let config = ErpConfig::new(
            &format!("{}/jsonrpc", server.uri()),
            "acme_prod",
            "sync-bot@acme.io",
            SecretString::from("9f2c7a41e0b86d53c1fa7e29b4d0586c3e71a9f2"),
        )
        .unwrap();
        ErpClient::new(config).unwrap()
    }

    async fn mount_authenticate(server: &MockServer, result: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"params": {"service": "common"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": result})))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_call_uses_cached_uid() {
        let server = MockServer::start().await;
        mount_authenticate(&server, json!(7)).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "params": {"service": "object", "args": ["acme_prod", 7]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": 3})))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let first: i64 = client
            .call_as("product.template", "search_count", vec![json!([])], Map::new())
            .await
            .unwrap();
        let second: i64 = client
            .clone()
            .call_as("product.template", "search_count", vec![json!([])], Map::new())
            .await
            .unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 3);
    }

    #[tokio::test]
    async fn test_rejected_credentials_block_calls() {
        let server = MockServer::start().await;
        mount_authenticate(&server, json!(false)).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"params": {"service": "object"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        for _ in 0..2 {
            let err = client
                .call("product.template", "search_read", vec![json!([])], Map::new())
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                ErpError::NotAuthenticated { ref login, ref database }
                    if login == "sync-bot@acme.io" && database == "acme_prod"
            ));
        }
    }

    #[tokio::test]
    async fn test_call_as_shape_mismatch() {
        let server = MockServer::start().await;
        mount_authenticate(&server, json!(7)).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"params": {"service": "object"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "nope"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .call_as::<Vec<Value>>("product.template", "search_read", vec![], Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ErpError::Parse(_)));
    }
}
