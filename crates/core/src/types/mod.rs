//! Core types for Catalog Bridge.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod id;
pub mod price;
pub mod status;

pub use catalog::{ErpModuleRecord, ErpProductRecord, StorefrontProduct};
pub use id::*;
pub use price::{Price, PriceError};
pub use status::*;
