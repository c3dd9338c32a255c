// SPDX-License-Identifier: MIT

//! Bundles and the store that owns them
//!
//! This module provides:
//! - `FieldName` / `FieldValue` / `FieldMap` - the fixed field vocabulary and its values
//! - `Payload` - opaque handle for host objects
//! - `BundleStore` - the shared registry with TTL and capacity eviction

mod field;
mod store;

pub use field::{FieldKind, FieldMap, FieldName, FieldValue, Payload};
pub use store::{
    Bundle, BundleId, BundleStore, StoreConfig, DEFAULT_CAPACITY, DEFAULT_TTL_SECS,
};
