//! Analysis object model.
//!
//! - [`Analysis`] - one simulation configuration
//! - [`TimeIncrements`] - time discretization with its timestep schedule
//! - [`Results`] - opaque results entity
//! - [`AnalysisTree`] - parent/child forest of a document's analyses

mod collaborators;
mod document;
mod model;
mod results;
mod time_increments;
mod tree;

pub use collaborators::{ContextSource, GeometrySource, ProblemView, RegionFill};
pub use document::{find_analysis, read_analyses, write_analyses, ANALYSES_TAG};
pub use model::{Analysis, AnalysisKind, ANALYSIS_TAG};
pub use results::{Results, RESULTS_TAG};
pub use time_increments::{
    IncrementOption, TimeIncrements, TimeStep, TimeStepRow, TIME_INCREMENTS_TAG, TIME_STEP_TAG,
};
pub use tree::{AnalysisNode, AnalysisTree};
