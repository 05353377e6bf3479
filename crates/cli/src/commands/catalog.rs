//! ERP listing commands.
//!
//! # Usage
//!
//! ```bash
//! cb-cli products --limit 50
//! cb-cli modules --json
//! ```

use catalog_bridge_core::{ErpModuleRecord, ErpProductRecord};
use catalog_bridge_sync::SyncConfig;
use catalog_bridge_sync::erp::{CatalogReader, ErpClient};

use super::describe_erp_error;

fn reader() -> Result<CatalogReader, Box<dyn std::error::Error>> {
    let config = SyncConfig::from_env()?;
    Ok(CatalogReader::new(ErpClient::new(config.erp)?))
}

/// List ERP products.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the ERP call fails.
#[allow(clippy::print_stdout)]
pub async fn products(limit: Option<u32>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let reader = reader()?;
    let limit = limit.unwrap_or_else(|| reader.client().config().product_limit());

    let products = reader
        .list_products(limit)
        .await
        .map_err(|e| describe_erp_error(&e))?;

    tracing::info!(count = products.len(), "Fetched ERP products");

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
    } else if products.is_empty() {
        println!("No products found in the ERP.");
    } else {
        print!("{}", product_table(&products));
    }
    Ok(())
}

/// List installed ERP modules.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the ERP call fails.
#[allow(clippy::print_stdout)]
pub async fn modules(limit: Option<u32>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let reader = reader()?;
    let limit = limit.unwrap_or_else(|| reader.client().config().module_limit());

    let modules = reader
        .list_modules(limit)
        .await
        .map_err(|e| describe_erp_error(&e))?;

    tracing::info!(count = modules.len(), "Fetched ERP modules");

    if json {
        println!("{}", serde_json::to_string_pretty(&modules)?);
    } else if modules.is_empty() {
        println!("No installed modules found in the ERP.");
    } else {
        print!("{}", module_table(&modules));
    }
    Ok(())
}

fn product_table(products: &[ErpProductRecord]) -> String {
    use std::fmt::Write;

    let mut out = format!("{:>8}  {:<40}  {:>10}  {}\n", "ID", "NAME", "PRICE", "SKU");
    for product in products {
        let _ = writeln!(
            out,
            "{:>8}  {:<40}  {:>10}  {}",
            product.erp_id.to_string(),
            product.name,
            product.price.to_string(),
            product.sku.as_deref().unwrap_or("-")
        );
    }
    out
}

fn module_table(modules: &[ErpModuleRecord]) -> String {
    use std::fmt::Write;

    let mut out = format!("{:<32}  {:<40}  {:<24}  {}\n", "NAME", "DESCRIPTION", "AUTHOR", "STATE");
    for module in modules {
        let _ = writeln!(
            out,
            "{:<32}  {:<40}  {:<24}  {}",
            module.name,
            module.short_description.as_deref().unwrap_or("-"),
            module.author.as_deref().unwrap_or("-"),
            module.state
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_bridge_core::{ErpId, ModuleState, Price};

    #[test]
    fn test_product_table() {
        let table = product_table(&[ErpProductRecord {
            erp_id: ErpId::new(42),
            name: "Widget".to_string(),
            price: Price::from_erp_float(19.99).unwrap_or(Price::ZERO),
            sku: None,
            description: None,
        }]);

        let mut lines = table.lines();
        assert!(lines.next().is_some_and(|header| header.contains("PRICE")));
        let row = lines.next().unwrap_or_default();
        assert!(row.contains("42"));
        assert!(row.contains("Widget"));
        assert!(row.contains("19.99"));
        assert!(row.trim_end().ends_with('-'));
    }

    #[test]
    fn test_module_table() {
        let table = module_table(&[ErpModuleRecord {
            name: "sale_management".to_string(),
            short_description: Some("Sales".to_string()),
            author: None,
            state: ModuleState::Installed,
        }]);
        assert!(table.lines().nth(1).is_some_and(|row| row.contains("sale_management")
            && row.contains("Sales")
            && row.trim_end().ends_with("installed")));
    }
}
