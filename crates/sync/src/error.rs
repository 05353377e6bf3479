//! Import error types.

use catalog_bridge_core::ErpId;
use serde::Serialize;
use thiserror::Error;

use crate::erp::{ErpError, RpcFault};
use crate::storefront::StoreError;

/// Why a single product import failed.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The ERP id was zero or negative. No network call was made.
    #[error("Invalid ERP product id {0}: must be a positive integer")]
    InvalidArgument(i64),

    /// The ERP has no product template with this id.
    #[error("ERP product {0} not found")]
    NotFound(ErpId),

    /// The ERP rejected the configured credentials.
    #[error("Cannot authenticate to ERP database '{database}' as '{login}'")]
    Authentication {
        /// Login used for authentication.
        login: String,
        /// ERP database name.
        database: String,
    },

    /// The ERP returned an explicit error for the call.
    #[error("ERP fault: {0}")]
    Fault(RpcFault),

    /// The ERP could not be reached or answered garbage.
    #[error("ERP transport error: {0}")]
    Transport(#[source] ErpError),

    /// Reading or writing the storefront failed.
    #[error("Storefront error: {0}")]
    Persistence(#[from] StoreError),
}

impl From<ErpError> for ImportError {
    fn from(err: ErpError) -> Self {
        match err {
            ErpError::NotAuthenticated { login, database } => {
                Self::Authentication { login, database }
            }
            ErpError::Fault(fault) => Self::Fault(fault),
            other => Self::Transport(other),
        }
    }
}

/// Coarse classification of an [`ImportError`], for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportErrorKind {
    InvalidArgument,
    NotFound,
    Authentication,
    Fault,
    Transport,
    Persistence,
}

impl ImportError {
    /// The kind of failure.
    #[must_use]
    pub const fn kind(&self) -> ImportErrorKind {
        match self {
            Self::InvalidArgument(_) => ImportErrorKind::InvalidArgument,
            Self::NotFound(_) => ImportErrorKind::NotFound,
            Self::Authentication { .. } => ImportErrorKind::Authentication,
            Self::Fault(_) => ImportErrorKind::Fault,
            Self::Transport(_) => ImportErrorKind::Transport,
            Self::Persistence(_) => ImportErrorKind::Persistence,
        }
    }
}

impl std::fmt::Display for ImportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::NotFound => "not_found",
            Self::Authentication => "authentication",
            Self::Fault => "fault",
            Self::Transport => "transport",
            Self::Persistence => "persistence",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_erp_error_mapping() {
        let auth = ImportError::from(ErpError::NotAuthenticated {
            login: "bot".to_string(),
            database: "db".to_string(),
        });
        assert_eq!(auth.kind(), ImportErrorKind::Authentication);

        let fault = ImportError::from(ErpError::Fault(RpcFault::new(json!({"message": "x"}))));
        assert_eq!(fault.kind(), ImportErrorKind::Fault);

        let malformed = ImportError::from(ErpError::MalformedResponse("empty".to_string()));
        assert_eq!(malformed.kind(), ImportErrorKind::Transport);
    }

    #[test]
    fn test_store_error_mapping() {
        let err = ImportError::from(StoreError::Rejected("disk full".to_string()));
        assert_eq!(err.kind(), ImportErrorKind::Persistence);
        assert_eq!(err.to_string(), "Storefront error: write rejected: disk full");
    }

    #[test]
    fn test_kind_display_matches_serde() {
        assert_eq!(ImportErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(
            serde_json::to_value(ImportErrorKind::InvalidArgument).ok(),
            Some(json!("invalid_argument"))
        );
    }
}
