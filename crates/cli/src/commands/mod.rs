//! CLI command implementations.

pub mod catalog;
pub mod import;
pub mod migrate;

use catalog_bridge_sync::erp::ErpError;

/// Shown when the ERP rejects the configured credentials.
pub const AUTH_FAILED_HINT: &str =
    "Could not authenticate with the ERP. Check ERP_URL, ERP_DATABASE, ERP_LOGIN and ERP_API_KEY.";

/// Turn an ERP error into a user-facing message, keeping authentication
/// failures distinct from everything else.
pub fn describe_erp_error(err: &ErpError) -> String {
    match err {
        ErpError::NotAuthenticated { .. } => format!("{AUTH_FAILED_HINT} ({err})"),
        other => format!("ERP request failed: {other}"),
    }
}
