//! Catalog Bridge CLI - ERP listings, product import and migrations.
//!
//! # Usage
//!
//! ```bash
//! # List the first 20 ERP products
//! cb-cli products
//!
//! # List installed ERP modules as JSON
//! cb-cli modules --json
//!
//! # Import specific ERP products into the storefront
//! cb-cli import 42 43 44
//!
//! # Import every listed product without touching the database
//! cb-cli import --all-listed --dry-run
//!
//! # Run storefront database migrations
//! cb-cli migrate
//! ```
//!
//! # Commands
//!
//! - `products` - List ERP products
//! - `modules` - List installed ERP modules
//! - `import` - Import ERP products into the storefront
//! - `migrate` - Run storefront database migrations

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use catalog_bridge_sync::TelemetryConfig;

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "cb-cli")]
#[command(author, version, about = "Catalog Bridge CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List ERP products
    Products {
        /// Maximum number of products (default: `ERP_PRODUCT_LIMIT` or 20)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List installed ERP modules
    Modules {
        /// Maximum number of modules (default: `ERP_MODULE_LIMIT` or 50)
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Import ERP products into the storefront
    Import {
        /// ERP product ids, imported in the order given
        #[arg(
            required_unless_present = "all_listed",
            conflicts_with = "all_listed",
            allow_negative_numbers = true
        )]
        erp_ids: Vec<i64>,

        /// Import every product returned by `products`
        #[arg(long)]
        all_listed: bool,

        /// Listing size for `--all-listed`
        #[arg(
            short,
            long,
            requires = "all_listed",
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        limit: Option<u32>,

        /// Import into an in-memory store instead of the storefront database
        #[arg(long)]
        dry_run: bool,
    },
    /// Run storefront database migrations
    Migrate,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider before any TLS client is built
    let _ = rustls::crypto::ring::default_provider().install_default();

    let sentry_guard = telemetry::init(&TelemetryConfig::from_env());

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        // process::exit skips destructors; flush Sentry first
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Products { limit, json } => commands::catalog::products(limit, json).await?,
        Commands::Modules { limit, json } => commands::catalog::modules(limit, json).await?,
        Commands::Import {
            erp_ids,
            all_listed,
            limit,
            dry_run,
        } => {
            let selection = if all_listed {
                commands::import::Selection::AllListed { limit }
            } else {
                commands::import::Selection::Ids(erp_ids)
            };
            commands::import::run(selection, dry_run).await?;
        }
        Commands::Migrate => commands::migrate::storefront().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_import_requires_ids_or_all_listed() {
        assert!(Cli::try_parse_from(["cb-cli", "import"]).is_err());
        assert!(Cli::try_parse_from(["cb-cli", "import", "42", "43"]).is_ok());
        assert!(Cli::try_parse_from(["cb-cli", "import", "--all-listed"]).is_ok());
        assert!(Cli::try_parse_from(["cb-cli", "import", "42", "--all-listed"]).is_err());
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(Cli::try_parse_from(["cb-cli", "products", "--limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["cb-cli", "modules", "-l", "0"]).is_err());
        assert!(
            Cli::try_parse_from(["cb-cli", "import", "--all-listed", "--limit", "0"]).is_err()
        );
        assert!(Cli::try_parse_from(["cb-cli", "products", "--limit", "1"]).is_ok());
    }

    #[test]
    fn test_limit_only_with_all_listed() {
        assert!(Cli::try_parse_from(["cb-cli", "import", "42", "--limit", "5"]).is_err());
        assert!(
            Cli::try_parse_from(["cb-cli", "import", "--all-listed", "--limit", "5", "--dry-run"])
                .is_ok()
        );
    }
}
