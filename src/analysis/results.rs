//! Results entity of an analysis.
//!
//! Results content is not interpreted here: every child and attribute is kept
//! and written back unchanged.

use crate::core::{Attributes, Element, PropertyContainer, PropertyStore, Schema};
use crate::util::Result;

/// Tag of the results element.
pub const RESULTS_TAG: &str = "Results";

/// Opaque results entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Results {
    attributes: Attributes,
    store: PropertyStore,
}

impl Results {
    /// Create empty results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from a `Results` element, attributes included.
    pub fn from_element(node: &Element) -> Result<Self> {
        let mut results = Self {
            attributes: node.attributes.clone(),
            store: PropertyStore::new(),
        };
        results.read(node)?;
        Ok(results)
    }

    /// Write as a child of `parent`.
    pub fn write_into(&self, parent: &mut Element) -> Result<()> {
        let node = parent.add_child(RESULTS_TAG);
        node.attributes = self.attributes.clone();
        self.write(node)
    }

    /// Attributes of the results element.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Child elements, in document order.
    pub fn elements(&self) -> &[Element] {
        self.store.extras()
    }
}

impl PropertyContainer for Results {
    const SCHEMA: Schema = Schema {
        entity: RESULTS_TAG,
        properties: &[],
    };

    fn store(&self) -> &PropertyStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_are_kept_verbatim() {
        let node = Element::new(RESULTS_TAG)
            .with_attr("Folder", "out")
            .with_child(Element::new("Step").with_attr("Time", "2"))
            .with_child(Element::with_text("Note", "converged"));

        let results = Results::from_element(&node).unwrap();
        assert_eq!(results.attributes().get("Folder"), Some("out"));
        assert_eq!(results.elements().len(), 2);

        let mut parent = Element::new("Analysis");
        results.write_into(&mut parent).unwrap();
        assert_eq!(parent.child(RESULTS_TAG), Some(&node));
    }
}
