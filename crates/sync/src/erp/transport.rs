//! JSON-RPC 2.0 transport.
//!
//! Every call is a single HTTP POST of an envelope of the form
//! `{"jsonrpc": "2.0", "method": "call", "params": {...}, "id": n}`. The ERP
//! answers with `{"result": ...}` or `{"error": {...}}`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;
use url::Url;

use super::{ErpError, RpcFault};

/// Longest response body kept in [`ErpError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
    id: u64,
}

#[derive(Debug, Serialize)]
struct RpcParams<'a> {
    service: &'a str,
    method: &'a str,
    args: Vec<Value>,
}

/// Low-level JSON-RPC client.
///
/// Stateless apart from the request id counter; authentication is handled by
/// the caller, which passes the uid into [`RpcTransport::execute_kw`].
#[derive(Debug)]
pub struct RpcTransport {
    client: reqwest::Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl RpcTransport {
    /// Create a transport for `endpoint` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ErpError::Http` if the HTTP client cannot be built (TLS backend
    /// initialisation failure).
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, ErpError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    /// The endpoint this transport posts to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Call `method` on an ERP `service` (`common`, `object`, ...).
    ///
    /// # Errors
    ///
    /// - `ErpError::Http` on network failure or timeout
    /// - `ErpError::Status` on a non-2xx response
    /// - `ErpError::MalformedResponse` if the body is not a JSON-RPC response
    /// - `ErpError::Fault` if the ERP returned an `error` object
    #[instrument(skip(self, args), fields(endpoint = %self.endpoint, id))]
    pub async fn call_service(
        &self,
        service: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, ErpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::Span::current().record("id", id);

        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params: RpcParams {
                service,
                method,
                args,
            },
            id,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "ERP returned non-success status");
            return Err(ErpError::Status {
                status,
                body: truncate(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ErpError::MalformedResponse(format!("body is not JSON: {e}")))?;

        extract_result(body)
    }

    /// Run `model.method(*args, **kwargs)` through `object.execute_kw`.
    ///
    /// # Errors
    ///
    /// Same as [`RpcTransport::call_service`].
    #[instrument(skip(self, api_key, args, kwargs), fields(database = %database, uid))]
    #[allow(clippy::too_many_arguments)]
    pub async fn execute_kw(
        &self,
        database: &str,
        uid: i64,
        api_key: &SecretString,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, ErpError> {
        let envelope_args = vec![
            Value::from(database),
            Value::from(uid),
            Value::from(api_key.expose_secret()),
            Value::from(model),
            Value::from(method),
            Value::Array(args),
            Value::Object(kwargs),
        ];

        self.call_service("object", "execute_kw", envelope_args)
            .await
    }
}

/// Pull `result` out of a response, or turn `error` into a fault.
///
/// `result: null` is a valid result; only a missing key is malformed.
fn extract_result(body: Value) -> Result<Value, ErpError> {
    let Value::Object(mut object) = body else {
        return Err(ErpError::MalformedResponse(
            "response is not a JSON object".to_string(),
        ));
    };

    if let Some(error) = object.remove("error").filter(|e| !e.is_null()) {
        return Err(ErpError::Fault(RpcFault::new(error)));
    }

    object.remove("result").ok_or_else(|| {
        ErpError::MalformedResponse("response has neither 'result' nor 'error'".to_string())
    })
}

fn truncate(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}…", body.get(..index).unwrap_or(body)),
        None => body.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport_for(server: &MockServer) -> RpcTransport {
        let endpoint = Url::parse(&format!("{}/jsonrpc", server.uri())).unwrap();
        RpcTransport::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_envelope_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params: RpcParams {
                service: "common",
                method: "authenticate",
                args: vec![json!("acme_prod"), json!("bot"), json!("key"), json!({})],
            },
            id: 7,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": {
                    "service": "common",
                    "method": "authenticate",
                    "args": ["acme_prod", "bot", "key", {}]
                },
                "id": 7
            })
        );
    }

    #[test]
    fn test_extract_result_null_is_valid() {
        assert_eq!(extract_result(json!({"result": null})).unwrap(), Value::Null);
    }

    #[test]
    fn test_extract_result_missing() {
        let err = extract_result(json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        assert!(matches!(err, ErpError::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_result_error_wins() {
        let err = extract_result(json!({"error": {"message": "boom"}})).unwrap_err();
        assert!(matches!(err, ErpError::Fault(ref f) if f.message() == "boom"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    #[tokio::test]
    async fn test_execute_kw_envelope_on_the_wire() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": {
                    "service": "object",
                    "method": "execute_kw",
                    "args": [
                        "acme_prod", 7, "k3y", "product.template", "search_read",
                        [[]], {"fields": ["name"], "limit": 5}
                    ]
                }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": [{"id": 1}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let mut kwargs = Map::new();
        kwargs.insert("fields".to_string(), json!(["name"]));
        kwargs.insert("limit".to_string(), json!(5));

        let result = transport
            .execute_kw(
                "acme_prod",
                7,
                &SecretString::from("k3y"),
                "product.template",
                "search_read",
                vec![json!([])],
                kwargs,
            )
            .await
            .unwrap();

        assert_eq!(result, json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_request_ids_are_unique() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        transport.call_service("common", "version", vec![]).await.unwrap();
        transport.call_service("common", "version", vec![]).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let ids: Vec<Value> = requests
            .iter()
            .map(|r| serde_json::from_slice::<Value>(&r.body).unwrap()["id"].clone())
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids.first(), ids.get(1));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .call_service("common", "version", vec![])
            .await
            .unwrap_err();

        match err {
            ErpError::Status { status, body } => {
                assert_eq!(status.as_u16(), 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .call_service("common", "version", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ErpError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fault_payload_passed_through() {
        let server = MockServer::start().await;
        let error = json!({"code": 200, "message": "Odoo Server Error", "data": {"message": "boom"}});
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": error.clone()})))
            .mount(&server)
            .await;

        let err = transport_for(&server)
            .call_service("object", "execute_kw", vec![])
            .await
            .unwrap_err();
        match err {
            ErpError::Fault(fault) => assert_eq!(fault.payload(), &error),
            other => panic!("expected Fault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"result": 1}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let endpoint = Url::parse(&server.uri()).unwrap();
        let transport = RpcTransport::new(endpoint, Duration::from_millis(50)).unwrap();
        let err = transport
            .call_service("common", "version", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ErpError::Http(ref e) if e.is_timeout()));
    }
}
