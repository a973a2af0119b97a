//! Utility types shared by every layer.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`ScalarKind`] / [`ScalarValue`] - Primitive kinds and their text encoding

mod error;
mod scalar;

pub use error::*;
pub use scalar::*;
