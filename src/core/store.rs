//! Property storage for schema-described entities.

use super::{Attributes, Element};

/// One record of a record-list property (attributes only).
pub type Record = Attributes;

/// Value held for a declared property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    /// Scalar as document text; coerced on access.
    Text(String),
    /// Ordered records of a record-list property.
    Records(Vec<Record>),
    /// Mapping subtree, kept verbatim.
    Mapping(Element),
}

impl PropertyValue {
    /// Name of the value shape, for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "scalar",
            Self::Records(_) => "record list",
            Self::Mapping(_) => "mapping",
        }
    }
}

/// Insertion-ordered property store with an opaque extras bucket.
///
/// Keys are the `'static` names from the owning entity's schema, so a key can
/// only be present if it was declared. Child elements the schema does not
/// declare are kept in `extras` and written back unchanged, each after the
/// declared property it followed in the document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyStore {
    entries: Vec<(&'static str, PropertyValue)>,
    extras: Vec<Element>,
    anchors: Vec<Option<&'static str>>,
}

impl PropertyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, keeping the original position if the key already exists.
    pub fn insert(&mut self, name: &'static str, value: PropertyValue) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
            return;
        }
        self.entries.push((name, value));
    }

    /// Get a value by name.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Get a mutable value by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.entries.iter_mut().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Check if a property is set.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| *k == name)
    }

    /// Remove a property and return its value.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        let pos = self.entries.iter().position(|(k, _)| *k == name)?;
        Some(self.entries.remove(pos).1)
    }

    /// Text of a scalar property, if set as text.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Records of a record-list property, if set.
    pub fn records(&self, name: &str) -> Option<&[Record]> {
        match self.get(name)? {
            PropertyValue::Records(r) => Some(r.as_slice()),
            _ => None,
        }
    }

    /// Number of declared properties currently set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no declared property is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over set properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Undeclared child elements, in document order.
    pub fn extras(&self) -> &[Element] {
        &self.extras
    }

    /// First undeclared child with the given tag.
    pub fn extra(&self, tag: &str) -> Option<&Element> {
        self.extras.iter().find(|e| e.tag == tag)
    }

    /// Keep an undeclared child element.
    ///
    /// `anchor` is the declared property it follows, `None` if it comes
    /// before every declared property.
    pub fn push_extra(&mut self, anchor: Option<&'static str>, element: Element) {
        self.extras.push(element);
        self.anchors.push(anchor);
    }

    /// Extras anchored after `anchor`, in document order.
    pub fn extras_after<'a>(&'a self, anchor: Option<&'a str>) -> impl Iterator<Item = &'a Element> + 'a {
        self.extras
            .iter()
            .zip(&self.anchors)
            .filter(move |(_, a)| **a == anchor)
            .map(|(e, _)| e)
    }

    /// Drop every value and extra.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.extras.clear();
        self.anchors.clear();
    }
}
