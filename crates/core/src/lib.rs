//! Catalog Bridge Core - Shared types library.
//!
//! This crate provides common types used across all Catalog Bridge components:
//! - `sync` - ERP JSON-RPC client and storefront upsert logic
//! - `cli` - Command-line tools for listing, importing and migrations
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices, storefront
//!   statuses, and the ERP/storefront catalog records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
