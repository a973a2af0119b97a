//! XML codec for project documents.
//!
//! Converts between XML text and the [`Element`](crate::core::Element) tree
//! using `quick-xml`. No schema validation is performed.

mod reader;
mod writer;

pub use reader::{parse_str, read_file};
pub use writer::{to_string, to_vec, write_file, WriteOptions};
