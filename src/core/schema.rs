//! Property schemas.
//!
//! Each entity type declares a static table of [`PropertyDescriptor`]s. The
//! table drives the generic read/write routine in [`super::traits`] and is
//! checked by every typed accessor.

use crate::util::ScalarKind;
use std::fmt;

/// Semantic kind of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Single primitive value stored as element text.
    Scalar(ScalarKind),
    /// Ordered list of attribute-only records.
    ///
    /// Encoded as a container element carrying a `Len` attribute whose
    /// children, tagged `item`, hold one record each.
    RecordList {
        /// Tag of each record element.
        item: &'static str,
    },
    /// Free-form key/value subtree, kept verbatim.
    Mapping,
    /// Sub-entity with its own schema, owned by the container.
    Nested(&'static str),
    /// Link to a collaborator owned elsewhere in the document.
    Reference,
}

impl PropertyKind {
    /// Check if this is a scalar property.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Check if this is a record-list property.
    pub fn is_record_list(&self) -> bool {
        matches!(self, Self::RecordList { .. })
    }

    /// Check if the container delegates this property to its entity hooks.
    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Nested(_) | Self::Reference)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::RecordList { item } => write!(f, "list of {item}"),
            Self::Mapping => f.write_str("mapping"),
            Self::Nested(ty) => write!(f, "{ty}"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

/// Declaration of a single property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Property name, identical to the element tag.
    pub name: &'static str,
    /// Declared kind.
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    /// Declare a scalar property.
    pub const fn scalar(name: &'static str, kind: ScalarKind) -> Self {
        Self { name, kind: PropertyKind::Scalar(kind) }
    }

    /// Declare a record-list property.
    pub const fn record_list(name: &'static str, item: &'static str) -> Self {
        Self { name, kind: PropertyKind::RecordList { item } }
    }

    /// Declare a mapping property.
    pub const fn mapping(name: &'static str) -> Self {
        Self { name, kind: PropertyKind::Mapping }
    }

    /// Declare a nested-entity property.
    pub const fn nested(name: &'static str, entity: &'static str) -> Self {
        Self { name, kind: PropertyKind::Nested(entity) }
    }

    /// Declare a reference property.
    pub const fn reference(name: &'static str) -> Self {
        Self { name, kind: PropertyKind::Reference }
    }
}

/// Ordered schema of an entity type.
#[derive(Clone, Copy, Debug)]
pub struct Schema {
    /// Entity type name, used in diagnostics.
    pub entity: &'static str,
    /// Declared properties in write order.
    pub properties: &'static [PropertyDescriptor],
}

impl Schema {
    /// Find a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&'static PropertyDescriptor> {
        self.properties.iter().find(|d| d.name == name)
    }

    /// Check whether a property is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate over descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static PropertyDescriptor> {
        self.properties.iter()
    }
}
