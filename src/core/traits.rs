//! The schema-driven property container.
//!
//! [`PropertyContainer`] gives every entity the same read/write contract:
//! scalars are stored as text and coerced on access, record lists go through
//! the `Len`-prefixed record codec, mappings are kept verbatim, and nested
//! entities or references are handed to the entity's own hooks.

use tracing::{debug, warn};

use super::{Element, PropertyDescriptor, PropertyKind, PropertyStore, PropertyValue, Record, Schema};
use crate::util::{Error, Result, ScalarValue};

/// Attribute holding the record count of a record-list element.
pub const LEN_ATTRIBUTE: &str = "Len";

// ============================================================================
// Container Trait
// ============================================================================

/// An entity backed by a [`PropertyStore`] and described by a static [`Schema`].
pub trait PropertyContainer {
    /// Schema of this entity type.
    const SCHEMA: Schema;

    /// Property store.
    fn store(&self) -> &PropertyStore;

    /// Mutable property store.
    fn store_mut(&mut self) -> &mut PropertyStore;

    /// Read a `Nested` or `Reference` property from its element.
    ///
    /// Entities without such properties keep the element verbatim, in place.
    fn read_entity(&mut self, descriptor: &'static PropertyDescriptor, node: &Element) -> Result<()> {
        warn!(
            entity = Self::SCHEMA.entity,
            property = descriptor.name,
            "no entity reader, keeping element verbatim"
        );
        self.store_mut().push_extra(Some(descriptor.name), node.clone());
        Ok(())
    }

    /// Append the element of a `Nested` or `Reference` property to `parent`.
    ///
    /// Absent values write nothing.
    fn write_entity(&self, _descriptor: &'static PropertyDescriptor, _parent: &mut Element) -> Result<()> {
        Ok(())
    }

    /// Drop everything a previous `read` left behind.
    ///
    /// Entities holding state outside the store extend this.
    fn reset(&mut self) {
        self.store_mut().clear();
    }

    /// Called once `read` has consumed every child.
    fn finish_read(&mut self) -> Result<()> {
        Ok(())
    }

    /// Replace the content of this entity with the children of `node`.
    ///
    /// When a declared tag repeats, the last occurrence wins.
    fn read(&mut self, node: &Element) -> Result<()> {
        debug!(entity = Self::SCHEMA.entity, children = node.children.len(), "reading");
        self.reset();
        let mut anchor = None;
        for child in node.children() {
            let Some(descriptor) = Self::SCHEMA.get(&child.tag) else {
                debug!(entity = Self::SCHEMA.entity, tag = %child.tag, "keeping undeclared element");
                self.store_mut().push_extra(anchor, child.clone());
                continue;
            };
            anchor = Some(descriptor.name);
            if self.store().contains(descriptor.name) {
                warn!(
                    entity = Self::SCHEMA.entity,
                    property = descriptor.name,
                    "property repeated, keeping the last value"
                );
            }
            match descriptor.kind {
                PropertyKind::Scalar(_) => {
                    let text = PropertyValue::Text(child.text().to_string());
                    self.store_mut().insert(descriptor.name, text);
                }
                PropertyKind::RecordList { .. } => {
                    let records = decode_records(Self::SCHEMA.entity, descriptor.name, child);
                    self.store_mut().insert(descriptor.name, PropertyValue::Records(records));
                }
                PropertyKind::Mapping => {
                    self.store_mut().insert(descriptor.name, PropertyValue::Mapping(child.clone()));
                }
                PropertyKind::Nested(_) | PropertyKind::Reference => {
                    self.read_entity(descriptor, child)?;
                }
            }
        }
        self.finish_read()
    }

    /// Append one child per set property to `node`, in schema order.
    ///
    /// Undeclared elements follow the declared property they followed when
    /// read; those read ahead of every declared property come first.
    fn write(&self, node: &mut Element) -> Result<()> {
        debug!(entity = Self::SCHEMA.entity, properties = self.store().len(), "writing");
        for extra in self.store().extras_after(None) {
            node.push_child(extra.clone());
        }
        for descriptor in Self::SCHEMA.iter() {
            if descriptor.kind.is_entity() {
                self.write_entity(descriptor, node)?;
            } else if let Some(value) = self.store().get(descriptor.name) {
                write_value(descriptor, value, node.add_child(descriptor.name))?;
            }
            for extra in self.store().extras_after(Some(descriptor.name)) {
                node.push_child(extra.clone());
            }
        }
        Ok(())
    }

    // ========================================================================
    // Typed access
    // ========================================================================

    /// Look up a declared property.
    fn descriptor(name: &str) -> Result<&'static PropertyDescriptor> {
        Self::SCHEMA.get(name).ok_or_else(|| Error::UnknownProperty {
            entity: Self::SCHEMA.entity,
            name: name.to_string(),
        })
    }

    /// Check whether a property is set.
    fn is_set(&self, name: &str) -> bool {
        self.store().contains(name)
    }

    /// Coerce a scalar property to `T`.
    ///
    /// Fails with [`Error::MissingProperty`] if the property was never set.
    fn get<T: ScalarValue>(&self, name: &str) -> Result<T> {
        self.get_opt(name)?
            .ok_or_else(|| Error::MissingProperty(name.to_string()))
    }

    /// Coerce a scalar property to `T`, `None` if unset.
    fn get_opt<T: ScalarValue>(&self, name: &str) -> Result<Option<T>> {
        let descriptor = scalar_descriptor::<Self, T>(name)?;
        let Some(text) = self.store().text(descriptor.name) else {
            return Ok(None);
        };
        T::from_text(text).map(Some).ok_or_else(|| Error::InvalidValue {
            name: descriptor.name.to_string(),
            value: text.to_string(),
            expected: T::KIND.name(),
        })
    }

    /// Coerce a scalar property to `T`, falling back to `default` if unset.
    fn get_or<T: ScalarValue>(&self, name: &str, default: T) -> Result<T> {
        Ok(self.get_opt(name)?.unwrap_or(default))
    }

    /// Set a scalar property from a typed value.
    fn set<T: ScalarValue>(&mut self, name: &str, value: T) -> Result<()> {
        let descriptor = scalar_descriptor::<Self, T>(name)?;
        self.store_mut()
            .insert(descriptor.name, PropertyValue::Text(value.to_text()));
        Ok(())
    }

    /// Set a scalar property from raw document text.
    ///
    /// The text must coerce to the declared kind.
    fn set_text(&mut self, name: &str, text: &str) -> Result<()> {
        let descriptor = Self::descriptor(name)?;
        let PropertyKind::Scalar(kind) = descriptor.kind else {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: descriptor.kind.to_string(),
                actual: "scalar".to_string(),
            });
        };
        if !kind.accepts(text) {
            return Err(Error::InvalidValue {
                name: name.to_string(),
                value: text.to_string(),
                expected: kind.name(),
            });
        }
        self.store_mut()
            .insert(descriptor.name, PropertyValue::Text(text.to_string()));
        Ok(())
    }

    /// Remove a property from the store.
    fn unset(&mut self, name: &str) -> Option<PropertyValue> {
        self.store_mut().remove(name)
    }

    /// Records of a record-list property.
    fn records(&self, name: &str) -> Result<&[Record]> {
        let descriptor = Self::descriptor(name)?;
        if !descriptor.kind.is_record_list() {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: descriptor.kind.to_string(),
                actual: "record list".to_string(),
            });
        }
        self.store()
            .records(descriptor.name)
            .ok_or_else(|| Error::MissingProperty(name.to_string()))
    }

    /// Replace the records of a record-list property.
    fn set_records(&mut self, name: &str, records: Vec<Record>) -> Result<()> {
        let descriptor = Self::descriptor(name)?;
        if !descriptor.kind.is_record_list() {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: descriptor.kind.to_string(),
                actual: "record list".to_string(),
            });
        }
        self.store_mut()
            .insert(descriptor.name, PropertyValue::Records(records));
        Ok(())
    }

    /// Subtree of a mapping property.
    fn mapping(&self, name: &str) -> Result<&Element> {
        let descriptor = Self::descriptor(name)?;
        if descriptor.kind != PropertyKind::Mapping {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: descriptor.kind.to_string(),
                actual: "mapping".to_string(),
            });
        }
        match self.store().get(descriptor.name) {
            Some(PropertyValue::Mapping(element)) => Ok(element),
            _ => Err(Error::MissingProperty(name.to_string())),
        }
    }

    /// Replace a mapping property. The element tag is normalised to the property name.
    fn set_mapping(&mut self, name: &str, mut mapping: Element) -> Result<()> {
        let descriptor = Self::descriptor(name)?;
        if descriptor.kind != PropertyKind::Mapping {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: descriptor.kind.to_string(),
                actual: "mapping".to_string(),
            });
        }
        mapping.tag = descriptor.name.to_string();
        self.store_mut()
            .insert(descriptor.name, PropertyValue::Mapping(mapping));
        Ok(())
    }
}

/// Fill `child` from a stored value of a non-entity property.
fn write_value(descriptor: &PropertyDescriptor, value: &PropertyValue, child: &mut Element) -> Result<()> {
    match (value, descriptor.kind) {
        (PropertyValue::Text(text), _) => child.set_text(text.as_str()),
        (PropertyValue::Records(records), PropertyKind::RecordList { item }) => {
            encode_records(child, item, records);
        }
        (PropertyValue::Records(_), kind) => {
            return Err(Error::TypeMismatch {
                name: descriptor.name.to_string(),
                expected: kind.to_string(),
                actual: value.shape().to_string(),
            });
        }
        (PropertyValue::Mapping(mapping), _) => {
            child.attributes = mapping.attributes.clone();
            child.text = mapping.text.clone();
            child.children = mapping.children.clone();
        }
    }
    Ok(())
}

/// Resolve `name` and check it is a scalar of `T`'s kind.
fn scalar_descriptor<C, T>(name: &str) -> Result<&'static PropertyDescriptor>
where
    C: PropertyContainer + ?Sized,
    T: ScalarValue,
{
    let descriptor = C::descriptor(name)?;
    match descriptor.kind {
        PropertyKind::Scalar(kind) if kind == T::KIND => Ok(descriptor),
        kind => Err(Error::TypeMismatch {
            name: name.to_string(),
            expected: kind.to_string(),
            actual: T::KIND.to_string(),
        }),
    }
}

// ============================================================================
// Record-list codec
// ============================================================================

/// Decode the records of a record-list element.
///
/// Every child is one record; its attributes are the record fields. The `Len`
/// attribute is redundant with the child count and only checked for a warning.
pub fn decode_records(entity: &'static str, list: &'static str, node: &Element) -> Vec<Record> {
    let records: Vec<Record> = node.children().map(|c| c.attributes.clone()).collect();
    if let Some(len) = node.attr(LEN_ATTRIBUTE) {
        if len.trim().parse::<usize>().ok() != Some(records.len()) {
            warn!(entity, list, len, actual = records.len(), "record list Len disagrees with its children");
        }
    }
    records
}

/// Encode records into `node`, one `item` child per record plus `Len`.
pub fn encode_records(node: &mut Element, item: &str, records: &[Record]) {
    node.set_attr(LEN_ATTRIBUTE, records.len().to_string());
    for record in records {
        node.add_child(item).attributes = record.clone();
    }
}

/// Key/value view of a mapping subtree: attributes first, then leaf children.
pub fn mapping_entries(mapping: &Element) -> Vec<(&str, &str)> {
    let mut entries: Vec<(&str, &str)> = mapping.attributes.iter().collect();
    entries.extend(
        mapping
            .children()
            .filter(|c| c.children.is_empty())
            .map(|c| (c.tag.as_str(), c.text())),
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ScalarKind;

    #[derive(Default)]
    struct Widget {
        store: PropertyStore,
    }

    impl PropertyContainer for Widget {
        const SCHEMA: Schema = Schema {
            entity: "Widget",
            properties: &[
                PropertyDescriptor::scalar("Count", ScalarKind::Integer),
                PropertyDescriptor::scalar("Label", ScalarKind::String),
                PropertyDescriptor::scalar("Enabled", ScalarKind::Boolean),
                PropertyDescriptor::record_list("Items", "Item"),
                PropertyDescriptor::mapping("Options"),
            ],
        };

        fn store(&self) -> &PropertyStore {
            &self.store
        }

        fn store_mut(&mut self) -> &mut PropertyStore {
            &mut self.store
        }
    }

    fn sample() -> Element {
        Element::new("Widget")
            .with_child(Element::with_text("Count", "3"))
            .with_child(Element::with_text("Label", "abc"))
            .with_child(
                Element::new("Items")
                    .with_attr("Len", "2")
                    .with_child(Element::new("Item").with_attr("a", "1"))
                    .with_child(Element::new("Item").with_attr("a", "2").with_attr("b", "x")),
            )
            .with_child(Element::new("Options").with_child(Element::with_text("Heat", "true")))
            .with_child(Element::with_text("Unknown", "kept"))
    }

    #[test]
    fn test_read_stores_text_lazily() {
        let mut widget = Widget::default();
        widget.read(&sample()).unwrap();

        assert_eq!(widget.store().text("Count"), Some("3"));
        assert_eq!(widget.get::<i64>("Count").unwrap(), 3);
        assert_eq!(widget.get::<String>("Label").unwrap(), "abc");
        assert_eq!(widget.records("Items").unwrap().len(), 2);
        assert_eq!(widget.store().extra("Unknown").map(Element::text), Some("kept"));
    }

    #[test]
    fn test_missing_and_mismatched_access() {
        let mut widget = Widget::default();
        widget.read(&sample()).unwrap();

        assert!(matches!(widget.get::<bool>("Enabled"), Err(Error::MissingProperty(_))));
        assert!(widget.get_or("Enabled", true).unwrap());
        assert!(matches!(widget.get::<f64>("Count"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(widget.get::<i64>("Nope"), Err(Error::UnknownProperty { .. })));

        widget.set_text("Label", "free text").unwrap();
        assert!(matches!(widget.set_text("Count", "many"), Err(Error::InvalidValue { .. })));
    }

    #[test]
    fn test_invalid_text_fails_on_access_not_read() {
        let node = Element::new("Widget").with_child(Element::with_text("Enabled", "yes"));
        let mut widget = Widget::default();
        widget.read(&node).unwrap();
        assert!(matches!(widget.get::<bool>("Enabled"), Err(Error::InvalidValue { .. })));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut widget = Widget::default();
        widget.read(&sample()).unwrap();

        let mut out = Element::new("Widget");
        widget.write(&mut out).unwrap();
        let items = out.child("Items").unwrap();
        assert_eq!(items.attr(LEN_ATTRIBUTE), Some("2"));
        assert!(items.children().all(|c| c.tag == "Item"));

        let mut again = Widget::default();
        again.read(&out).unwrap();
        assert_eq!(again.store(), widget.store());
    }

    #[test]
    fn test_unset_properties_are_skipped_on_write() {
        let mut widget = Widget::default();
        widget.set("Enabled", false).unwrap();
        let mut out = Element::new("Widget");
        widget.write(&mut out).unwrap();
        assert_eq!(out.children.len(), 1);
        assert_eq!(out.child("Enabled").map(Element::text), Some("false"));
    }

    #[test]
    fn test_len_is_not_trusted() {
        let node = Element::new("Widget").with_child(
            Element::new("Items")
                .with_attr("Len", "5")
                .with_child(Element::new("Item")),
        );
        let mut widget = Widget::default();
        widget.read(&node).unwrap();
        assert_eq!(widget.records("Items").unwrap().len(), 1);
    }

    #[test]
    fn test_read_twice_does_not_duplicate() {
        let mut widget = Widget::default();
        widget.set("Enabled", true).unwrap();
        widget.read(&sample()).unwrap();
        widget.read(&sample()).unwrap();

        assert!(!widget.is_set("Enabled"));
        assert_eq!(widget.store().extras().len(), 1);
        let mut out = Element::new("Widget");
        widget.write(&mut out).unwrap();
        assert_eq!(out.children_named("Unknown").count(), 1);
        assert_eq!(out, sample());
    }

    #[test]
    fn test_undeclared_elements_keep_document_position() {
        let node = Element::new("Widget")
            .with_child(Element::new("Lead"))
            .with_child(Element::with_text("Count", "1"))
            .with_child(Element::new("AfterCount"))
            .with_child(Element::with_text("Label", "x"));
        let mut widget = Widget::default();
        widget.read(&node).unwrap();

        let mut out = Element::new("Widget");
        widget.write(&mut out).unwrap();
        assert_eq!(out, node);
    }

    #[test]
    fn test_repeated_scalar_keeps_last() {
        let node = Element::new("Widget")
            .with_child(Element::with_text("Count", "1"))
            .with_child(Element::with_text("Count", "2"));
        let mut widget = Widget::default();
        widget.read(&node).unwrap();
        assert_eq!(widget.get::<i64>("Count").unwrap(), 2);
        assert_eq!(widget.store().len(), 1);
    }

    #[test]
    fn test_mapping_entries() {
        let mut widget = Widget::default();
        widget.read(&sample()).unwrap();
        let options = widget.mapping("Options").unwrap();
        assert_eq!(mapping_entries(options), vec![("Heat", "true")]);
    }
}
