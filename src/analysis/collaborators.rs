//! Interfaces of the entities an analysis links to.
//!
//! Geometry and context live elsewhere in the project document. An analysis
//! only holds non-owning references to them and uses the narrow lookups below.

/// Geometry as seen from an analysis.
pub trait GeometrySource {
    /// Identity of the geometry within its document.
    fn id(&self) -> i64;

    /// Coordinates of a point. Point ids are 1-based, as stored in documents.
    fn point(&self, id: usize) -> Option<[f64; 2]>;

    /// Point ids outlining a region.
    fn region(&self, index: usize) -> Option<Vec<usize>>;
}

/// Material and boundary-condition coupling as seen from an analysis.
pub trait ContextSource {
    /// `(region index, material id)` pairs, `None` if no materials are assigned.
    fn region_materials(&self) -> Option<Vec<(usize, i64)>>;
}

/// A region filled with its assigned material.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionFill {
    /// Region index in the geometry.
    pub region: usize,
    /// Material id from the context.
    pub material: i64,
    /// Outline coordinates, in region point order.
    pub polygon: Vec<[f64; 2]>,
}

/// Everything needed to draw an analysis problem.
#[derive(Clone, Debug, PartialEq)]
pub struct ProblemView {
    /// Geometry the problem is drawn on.
    pub geometry_id: i64,
    /// Material-filled regions, sorted by region index.
    pub regions: Vec<RegionFill>,
}
