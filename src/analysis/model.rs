//! Analysis entity.
//!
//! An analysis is one simulation configuration inside a project document. It
//! owns its [`TimeIncrements`] and [`Results`], and links to a geometry and a
//! context that belong to the document.

use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use tracing::{debug, warn};

use super::{
    ContextSource, GeometrySource, ProblemView, RegionFill, Results, TimeIncrements, RESULTS_TAG,
    TIME_INCREMENTS_TAG,
};
use crate::core::{
    mapping_entries, Element, PropertyContainer, PropertyDescriptor, PropertyStore, PropertyValue, Schema,
};
use crate::util::{Error, Result, ScalarKind, ScalarValue};

/// Tag of an analysis element.
pub const ANALYSIS_TAG: &str = "Analysis";

/// GeoStudio product an analysis belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    /// Groundwater seepage.
    Seep,
    /// Slope stability.
    Slope,
    /// Stress-deformation.
    Sigma,
    /// Dynamic earthquake.
    Quake,
    /// Geothermal.
    Temp,
    /// Contaminant transport.
    Ctran,
    /// Air flow.
    Air,
    /// Vadose zone.
    Vadose,
}

impl AnalysisKind {
    /// Every known kind.
    pub const ALL: [Self; 8] = [
        Self::Seep,
        Self::Slope,
        Self::Sigma,
        Self::Quake,
        Self::Temp,
        Self::Ctran,
        Self::Air,
        Self::Vadose,
    ];

    /// Document token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seep => "SEEP/W",
            Self::Slope => "SLOPE/W",
            Self::Sigma => "SIGMA/W",
            Self::Quake => "QUAKE/W",
            Self::Temp => "TEMP/W",
            Self::Ctran => "CTRAN/W",
            Self::Air => "AIR/W",
            Self::Vadose => "VADOSE/W",
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = Error;

    /// Accepts the document token with or without the `/W` suffix.
    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        let bare = token.strip_suffix("/W").unwrap_or(token);
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().strip_suffix("/W") == Some(bare))
            .ok_or_else(|| Error::InvalidValue {
                name: Analysis::KIND.to_string(),
                value: token.to_string(),
                expected: "analysis kind",
            })
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link from an analysis to its geometry.
///
/// This is the only place the geometry identity lives. A document read yields
/// the raw `GeometryId` text; binding a live geometry replaces it, after which
/// the id is always taken from the geometry itself.
#[derive(Clone, Debug)]
enum GeometryLink {
    Document(String),
    Live(Weak<dyn GeometrySource>),
}

/// Analysis entity.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    store: PropertyStore,
    geometry: Option<GeometryLink>,
    context: Option<Weak<dyn ContextSource>>,
    results: Option<Results>,
    time_increments: Option<TimeIncrements>,
}

impl Analysis {
    /// Identity within the document.
    pub const ID: &'static str = "ID";
    /// Display name.
    pub const NAME: &'static str = "Name";
    /// Product kind, see [`AnalysisKind`].
    pub const KIND: &'static str = "Kind";
    /// Free description.
    pub const DESCRIPTION: &'static str = "Description";
    /// ID of the parent analysis.
    pub const PARENT_ID: &'static str = "ParentID";
    /// Solution method.
    pub const METHOD: &'static str = "Method";
    /// Identity of the linked geometry.
    pub const GEOMETRY_ID: &'static str = "GeometryId";
    /// Linked geometry (not serialized).
    pub const GEOMETRY: &'static str = "Geometry";
    /// Linked context (not serialized).
    pub const CONTEXT: &'static str = "Context";
    /// Exclude initial deformation flag.
    pub const EXCLUDE_INIT_DEFORMATION: &'static str = "ExcludeInitDeformation";
    /// Results entity.
    pub const RESULTS: &'static str = RESULTS_TAG;
    /// Time discretization entity.
    pub const TIME_INCREMENTS: &'static str = TIME_INCREMENTS_TAG;
    /// Physics computed by the analysis.
    pub const COMPUTED_PHYSICS: &'static str = "ComputedPhysics";
    /// Physics options.
    pub const PHYSICS_OPTIONS: &'static str = "PhysicsOptions";

    /// Create an analysis with its identifying properties set.
    pub fn new(id: i64, name: &str, kind: AnalysisKind) -> Self {
        let mut analysis = Self::default();
        analysis.set_required(id, name, kind);
        analysis
    }

    fn set_required(&mut self, id: i64, name: &str, kind: AnalysisKind) {
        self.store.insert(Self::ID, PropertyValue::Text(id.to_text()));
        self.store.insert(Self::NAME, PropertyValue::Text(name.to_string()));
        self.store.insert(Self::KIND, PropertyValue::Text(kind.as_str().to_string()));
    }

    /// Read from an `Analysis` element.
    pub fn from_element(node: &Element) -> Result<Self> {
        let mut analysis = Self::default();
        analysis.read(node)?;
        Ok(analysis)
    }

    /// Write into a new `Analysis` element.
    pub fn to_element(&self) -> Result<Element> {
        let mut node = Element::new(ANALYSIS_TAG);
        self.write(&mut node)?;
        Ok(node)
    }

    // ========================================================================
    // Scalar accessors
    // ========================================================================

    /// Identity within the document.
    pub fn id(&self) -> Result<i64> {
        self.get(Self::ID)
    }

    /// Display name.
    pub fn name(&self) -> Result<String> {
        self.get(Self::NAME)
    }

    /// Set the display name.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.set(Self::NAME, name.to_string())
    }

    /// Product kind.
    pub fn kind(&self) -> Result<AnalysisKind> {
        self.get::<String>(Self::KIND)?.parse()
    }

    /// Free description.
    pub fn description(&self) -> Result<Option<String>> {
        self.get_opt(Self::DESCRIPTION)
    }

    /// Set the description.
    pub fn set_description(&mut self, description: &str) -> Result<()> {
        self.set(Self::DESCRIPTION, description.to_string())
    }

    /// Parent analysis ID, `None` for a root analysis.
    pub fn parent_id(&self) -> Result<Option<i64>> {
        self.get_opt(Self::PARENT_ID)
    }

    /// Set or clear the parent analysis.
    pub fn set_parent_id(&mut self, parent: Option<i64>) -> Result<()> {
        match parent {
            Some(id) => self.set(Self::PARENT_ID, id),
            None => {
                self.unset(Self::PARENT_ID);
                Ok(())
            }
        }
    }

    /// Solution method.
    pub fn method(&self) -> Result<Option<String>> {
        self.get_opt(Self::METHOD)
    }

    /// Exclude initial deformation flag.
    pub fn exclude_init_deformation(&self) -> Result<Option<bool>> {
        self.get_opt(Self::EXCLUDE_INIT_DEFORMATION)
    }

    /// Computed physics as key/value pairs.
    pub fn computed_physics(&self) -> Result<Vec<(&str, &str)>> {
        Ok(mapping_entries(self.mapping(Self::COMPUTED_PHYSICS)?))
    }

    /// Physics options as key/value pairs.
    pub fn physics_options(&self) -> Result<Vec<(&str, &str)>> {
        Ok(mapping_entries(self.mapping(Self::PHYSICS_OPTIONS)?))
    }

    // ========================================================================
    // Owned entities
    // ========================================================================

    /// Time discretization, if the analysis has one.
    pub fn time_increments(&self) -> Option<&TimeIncrements> {
        self.time_increments.as_ref()
    }

    /// Time discretization, created empty on first use.
    pub fn time_increments_mut(&mut self) -> &mut TimeIncrements {
        self.time_increments.get_or_insert_with(TimeIncrements::new)
    }

    /// Results entity, if present.
    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    /// Replace the results entity.
    pub fn set_results(&mut self, results: Results) {
        self.results = Some(results);
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Link a geometry. Only a weak reference is kept.
    ///
    /// The geometry is not checked to belong to the same document.
    pub fn set_geometry<G: GeometrySource + 'static>(&mut self, geometry: &Rc<G>) {
        let weak = Rc::downgrade(geometry) as Weak<dyn GeometrySource>;
        debug!(geometry_id = geometry.id(), "geometry linked");
        self.geometry = Some(GeometryLink::Live(weak));
    }

    /// Linked geometry, if set and still alive.
    pub fn geometry(&self) -> Option<Rc<dyn GeometrySource>> {
        match self.geometry.as_ref()? {
            GeometryLink::Live(weak) => weak.upgrade(),
            GeometryLink::Document(_) => None,
        }
    }

    /// Identity of the linked geometry.
    ///
    /// Taken from the live geometry when one is linked, otherwise from the
    /// `GeometryId` read from the document.
    pub fn geometry_id(&self) -> Result<Option<i64>> {
        match &self.geometry {
            None => Ok(None),
            Some(GeometryLink::Live(weak)) => Ok(weak.upgrade().map(|g| g.id())),
            Some(GeometryLink::Document(text)) => i64::from_text(text)
                .map(Some)
                .ok_or_else(|| Error::InvalidValue {
                    name: Self::GEOMETRY_ID.to_string(),
                    value: text.clone(),
                    expected: ScalarKind::Integer.name(),
                }),
        }
    }

    /// Link a context. Only a weak reference is kept.
    pub fn set_context<C: ContextSource + 'static>(&mut self, context: &Rc<C>) {
        self.context = Some(Rc::downgrade(context) as Weak<dyn ContextSource>);
    }

    /// Linked context, if set and still alive.
    pub fn context(&self) -> Option<Rc<dyn ContextSource>> {
        self.context.as_ref()?.upgrade()
    }

    /// Gather the geometry outline and per-region material fills.
    ///
    /// Fails with [`Error::MissingCollaborator`] naming `Geometry` or
    /// `Context` when either is not linked.
    pub fn render_problem(&self) -> Result<ProblemView> {
        let geometry = self
            .geometry()
            .ok_or(Error::MissingCollaborator(Self::GEOMETRY))?;
        let context = self
            .context()
            .ok_or(Error::MissingCollaborator(Self::CONTEXT))?;

        let Some(mut assignments) = context.region_materials() else {
            debug!("no materials assigned to regions, geometry only");
            return Ok(ProblemView {
                geometry_id: geometry.id(),
                regions: Vec::new(),
            });
        };
        assignments.sort_by_key(|&(region, _)| region);

        let mut regions = Vec::with_capacity(assignments.len());
        for (region, material) in assignments {
            let point_ids = geometry.region(region).ok_or_else(|| {
                Error::invalid(format!("region {region} not found in geometry {}", geometry.id()))
            })?;
            let polygon = point_ids
                .iter()
                .map(|&p| {
                    geometry
                        .point(p)
                        .ok_or_else(|| Error::invalid(format!("point {p} of region {region} not found")))
                })
                .collect::<Result<Vec<_>>>()?;
            regions.push(RegionFill {
                region,
                material,
                polygon,
            });
        }

        Ok(ProblemView {
            geometry_id: geometry.id(),
            regions,
        })
    }
}

impl PropertyContainer for Analysis {
    const SCHEMA: Schema = Schema {
        entity: ANALYSIS_TAG,
        properties: &[
            PropertyDescriptor::scalar(Analysis::ID, ScalarKind::Integer),
            PropertyDescriptor::scalar(Analysis::NAME, ScalarKind::String),
            PropertyDescriptor::scalar(Analysis::KIND, ScalarKind::String),
            PropertyDescriptor::scalar(Analysis::DESCRIPTION, ScalarKind::String),
            PropertyDescriptor::scalar(Analysis::PARENT_ID, ScalarKind::Integer),
            PropertyDescriptor::scalar(Analysis::METHOD, ScalarKind::String),
            PropertyDescriptor::reference(Analysis::GEOMETRY_ID),
            PropertyDescriptor::reference(Analysis::GEOMETRY),
            PropertyDescriptor::reference(Analysis::CONTEXT),
            PropertyDescriptor::scalar(Analysis::EXCLUDE_INIT_DEFORMATION, ScalarKind::Boolean),
            PropertyDescriptor::nested(Analysis::RESULTS, RESULTS_TAG),
            PropertyDescriptor::nested(Analysis::TIME_INCREMENTS, TIME_INCREMENTS_TAG),
            PropertyDescriptor::mapping(Analysis::COMPUTED_PHYSICS),
            PropertyDescriptor::mapping(Analysis::PHYSICS_OPTIONS),
        ],
    };

    fn store(&self) -> &PropertyStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }

    /// Also drops the geometry link and owned entities. The context link has
    /// no document form and is kept.
    fn reset(&mut self) {
        self.store.clear();
        self.geometry = None;
        self.results = None;
        self.time_increments = None;
    }

    fn read_entity(&mut self, descriptor: &'static PropertyDescriptor, node: &Element) -> Result<()> {
        match descriptor.name {
            Self::GEOMETRY_ID => {
                self.geometry = Some(GeometryLink::Document(node.text().to_string()));
            }
            Self::RESULTS => self.results = Some(Results::from_element(node)?),
            Self::TIME_INCREMENTS => {
                self.time_increments = Some(TimeIncrements::from_element(node)?);
            }
            _ => {
                // Live links have no document form
                debug!(tag = %node.tag, "keeping link element verbatim");
                self.store.push_extra(Some(descriptor.name), node.clone());
            }
        }
        Ok(())
    }

    fn write_entity(&self, descriptor: &'static PropertyDescriptor, parent: &mut Element) -> Result<()> {
        match descriptor.name {
            Self::GEOMETRY_ID => match &self.geometry {
                Some(GeometryLink::Document(text)) => {
                    parent.add_child(Self::GEOMETRY_ID).set_text(text.as_str());
                }
                Some(GeometryLink::Live(weak)) => match weak.upgrade() {
                    Some(geometry) => {
                        parent.add_child(Self::GEOMETRY_ID).set_text(geometry.id().to_text());
                    }
                    None => warn!("linked geometry was dropped, GeometryId not written"),
                },
                None => {}
            },
            Self::RESULTS => {
                if let Some(results) = &self.results {
                    results.write_into(parent)?;
                }
            }
            Self::TIME_INCREMENTS => {
                if let Some(increments) = &self.time_increments {
                    increments.write(parent.add_child(Self::TIME_INCREMENTS))?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.store.text(Self::ID).unwrap_or("?");
        let name = self.store.text(Self::NAME).unwrap_or("");
        write!(f, "Analysis(ID: {id}, Name: \"{name}\")")
    }
}
