//! Status enums for storefront products and ERP modules.
//!
//! Storefront statuses use the storefront's own wire names (`publish`,
//! `instock`, ...) so they can be stored and compared without translation.

use serde::{Deserialize, Serialize};

/// Storefront product publication status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.publication_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    #[default]
    Draft,
    Pending,
    Private,
    Publish,
}

/// Where a storefront product is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.catalog_visibility", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum CatalogVisibility {
    /// Shop pages and search results.
    #[default]
    Visible,
    /// Shop pages only.
    Catalog,
    /// Search results only.
    Search,
    Hidden,
}

/// Storefront stock status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.stock_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    #[default]
    InStock,
    OutOfStock,
    OnBackorder,
}

/// Lifecycle state of an ERP module (`ir.module.module.state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ModuleState {
    #[serde(rename = "installed")]
    Installed,
    #[serde(rename = "uninstalled")]
    Uninstalled,
    #[serde(rename = "to install")]
    ToInstall,
    #[serde(rename = "to upgrade")]
    ToUpgrade,
    #[serde(rename = "to remove")]
    ToRemove,
    #[serde(rename = "uninstallable")]
    Uninstallable,
    /// A state this build does not know about.
    #[serde(rename = "unknown")]
    Unknown,
}

impl From<String> for ModuleState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "installed" => Self::Installed,
            "uninstalled" => Self::Uninstalled,
            "to install" => Self::ToInstall,
            "to upgrade" => Self::ToUpgrade,
            "to remove" => Self::ToRemove,
            "uninstallable" => Self::Uninstallable,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Pending => write!(f, "pending"),
            Self::Private => write!(f, "private"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

impl std::fmt::Display for CatalogVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Visible => write!(f, "visible"),
            Self::Catalog => write!(f, "catalog"),
            Self::Search => write!(f, "search"),
            Self::Hidden => write!(f, "hidden"),
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InStock => write!(f, "instock"),
            Self::OutOfStock => write!(f, "outofstock"),
            Self::OnBackorder => write!(f, "onbackorder"),
        }
    }
}

impl std::fmt::Display for ModuleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Installed => "installed",
            Self::Uninstalled => "uninstalled",
            Self::ToInstall => "to install",
            Self::ToUpgrade => "to upgrade",
            Self::ToRemove => "to remove",
            Self::Uninstallable => "uninstallable",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_publication_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&PublicationStatus::Publish).unwrap(),
            "\"publish\""
        );
        assert_eq!(PublicationStatus::Publish.to_string(), "publish");
        assert_eq!(PublicationStatus::default(), PublicationStatus::Draft);
    }

    #[test]
    fn test_stock_status_wire_names() {
        assert_eq!(serde_json::to_string(&StockStatus::InStock).unwrap(), "\"instock\"");
        assert_eq!(StockStatus::OnBackorder.to_string(), "onbackorder");
    }

    #[test]
    fn test_module_state_spaces() {
        let state: ModuleState = serde_json::from_str("\"to upgrade\"").unwrap();
        assert_eq!(state, ModuleState::ToUpgrade);
        assert_eq!(state.to_string(), "to upgrade");
    }

    #[test]
    fn test_module_state_unknown() {
        let state: ModuleState = serde_json::from_str("\"half-installed\"").unwrap();
        assert_eq!(state, ModuleState::Unknown);
    }
}
