//! # GeoStudio
//!
//! Object model for the analyses of GeoStudio project documents.
//!
//! Entities are property containers driven by static schemas: properties
//! are read from and written back to an XML element tree, unknown content is
//! preserved, and scalar values are coerced to typed values on access.
//!
//! ## Modules
//!
//! - [`util`] - Errors and scalar coercion
//! - [`core`] - Element tree, schemas, property store and the container trait
//! - [`xml`] - XML reader and writer
//! - [`analysis`] - Analysis, TimeIncrements, Results and the analysis tree
//! - [`settings`] - Persistent tool settings
//!
//! ## Example
//!
//! ```ignore
//! use geostudio::prelude::*;
//!
//! let root = geostudio::xml::read_file("project.xml")?;
//! for analysis in read_analyses(&root)? {
//!     if let Some(increments) = analysis.time_increments() {
//!         println!("{analysis}: saved at {:?}", increments.saved_times()?);
//!     }
//! }
//! ```

pub mod util;
pub mod core;
pub mod xml;
pub mod analysis;
pub mod settings;

// Re-export commonly used types
pub use util::{Error, Result};
pub use analysis::{Analysis, AnalysisKind, Results, TimeIncrements};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result, ScalarValue};
    pub use crate::core::{Element, PropertyContainer};
    pub use crate::analysis::{
        find_analysis, read_analyses, write_analyses, Analysis, AnalysisKind, AnalysisTree,
        ContextSource, GeometrySource, IncrementOption, Results, TimeIncrements,
    };
    pub use crate::settings::Settings;
}
