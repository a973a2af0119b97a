//! Core layer - document tree and the schema-driven property container.
//!
//! This module provides:
//! - [`Element`] / [`Attributes`] - In-memory document tree
//! - [`Schema`] / [`PropertyDescriptor`] - Static per-entity property declarations
//! - [`PropertyStore`] - Ordered property values plus an opaque extras bucket
//! - [`PropertyContainer`] - Generic read/write and typed access

mod element;
mod schema;
mod store;
mod traits;

pub use element::{Attributes, Element};
pub use schema::{PropertyDescriptor, PropertyKind, Schema};
pub use store::{PropertyStore, PropertyValue, Record};
pub use traits::{decode_records, encode_records, mapping_entries, PropertyContainer, LEN_ATTRIBUTE};
