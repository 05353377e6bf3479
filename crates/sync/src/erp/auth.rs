//! ERP authentication.
//!
//! Calls `common.authenticate` with the configured database, login and API
//! key. The ERP answers with a positive user id on success or `false` on
//! failure. Every failed attempt, whether rejected, faulted or unreachable,
//! yields the rejected sentinel, and the outcome is cached for the lifetime of
//! the [`AuthCache`].

use secrecy::ExposeSecret;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::instrument;

use super::{ErpError, RpcTransport};
use crate::config::ErpConfig;

/// Result of an authentication attempt.
///
/// A uid of `0` is the rejected sentinel: the ERP refused the credentials,
/// faulted while checking them or could not be reached, and no further calls
/// should be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSession {
    uid: i64,
}

impl AuthSession {
    /// The rejected sentinel.
    pub const REJECTED: Self = Self { uid: 0 };

    /// A session for a known uid. Non-positive uids are rejected sessions.
    #[must_use]
    pub const fn from_uid(uid: i64) -> Self {
        if uid > 0 { Self { uid } } else { Self::REJECTED }
    }

    /// The ERP user id (`0` when rejected).
    #[must_use]
    pub const fn uid(&self) -> i64 {
        self.uid
    }

    /// Whether the ERP accepted the credentials.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.uid > 0
    }

    /// Interpret a `common.authenticate` result.
    ///
    /// Anything other than a positive integer (`false`, `null`, a string) is
    /// a rejection.
    fn from_result(result: &Value) -> Self {
        result.as_i64().map_or(Self::REJECTED, Self::from_uid)
    }
}

/// Authenticate once against `common.authenticate`.
///
/// Any failure of the call (fault, non-2xx, timeout, unparseable body) is a
/// rejection and returns [`AuthSession::REJECTED`].
#[instrument(skip(transport, config), fields(database = %config.database(), login = %config.login()))]
pub async fn authenticate(transport: &RpcTransport, config: &ErpConfig) -> AuthSession {
    let args = vec![
        Value::from(config.database()),
        Value::from(config.login()),
        Value::from(config.api_key().expose_secret()),
        Value::Object(serde_json::Map::new()),
    ];

    match transport.call_service("common", "authenticate", args).await {
        Ok(result) => {
            let session = AuthSession::from_result(&result);
            if session.is_authenticated() {
                tracing::info!(uid = session.uid(), "Authenticated with ERP");
            } else {
                tracing::warn!("ERP rejected credentials");
            }
            session
        }
        Err(ErpError::Fault(fault)) => {
            tracing::warn!(fault = %fault, "ERP faulted during authentication");
            AuthSession::REJECTED
        }
        Err(e) => {
            tracing::warn!(error = %e, "ERP authentication call failed");
            AuthSession::REJECTED
        }
    }
}

/// Process-wide authentication cache.
///
/// Holds at most one [`AuthSession`]. The first caller authenticates, every
/// later caller reuses the cached outcome, whether accepted or rejected.
#[derive(Debug, Default)]
pub struct AuthCache {
    session: RwLock<Option<AuthSession>>,
}

impl AuthCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache pre-filled with `session`.
    #[must_use]
    pub const fn with_session(session: AuthSession) -> Self {
        Self {
            session: RwLock::const_new(Some(session)),
        }
    }

    /// The cached session, if any attempt has completed.
    pub async fn cached(&self) -> Option<AuthSession> {
        *self.session.read().await
    }

    /// Return the cached session, authenticating first if the cache is empty.
    ///
    /// Concurrent callers on an empty cache serialize on the write lock, so at
    /// most one `authenticate` request is in flight.
    pub async fn get_or_authenticate(
        &self,
        transport: &RpcTransport,
        config: &ErpConfig,
    ) -> AuthSession {
        if let Some(session) = *self.session.read().await {
            return session;
        }

        let mut slot = self.session.write().await;
        if let Some(session) = *slot {
            return session;
        }

        let session = authenticate(transport, config).await;
        *slot = Some(session);
        session
    }
}
