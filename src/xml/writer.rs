//! [`Element`] tree to XML text.

use std::fs;
use std::io::Write;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;

use crate::core::Element;
use crate::util::{Error, Result};

/// Output formatting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Indentation character (usually space or tab).
    pub indent_char: u8,
    /// Indentation characters per level. 0 writes everything on one line.
    pub indent_size: usize,
    /// Emit `<?xml version="1.0" encoding="utf-8"?>` first.
    pub declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent_char: b' ',
            indent_size: 2,
            declaration: true,
        }
    }
}

impl WriteOptions {
    /// Single-line output without declaration.
    pub fn compact() -> Self {
        Self {
            indent_char: b' ',
            indent_size: 0,
            declaration: false,
        }
    }
}

/// Serialize a tree to a string.
pub fn to_string(root: &Element, options: &WriteOptions) -> Result<String> {
    let bytes = to_vec(root, options)?;
    Ok(String::from_utf8(bytes)?)
}

/// Serialize a tree to bytes.
pub fn to_vec(root: &Element, options: &WriteOptions) -> Result<Vec<u8>> {
    let mut writer = if options.indent_size > 0 {
        Writer::new_with_indent(Vec::new(), options.indent_char, options.indent_size)
    } else {
        Writer::new(Vec::new())
    };
    if options.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(Error::xml)?;
    }
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

/// Serialize a tree to disk.
pub fn write_file(path: impl AsRef<Path>, root: &Element, options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), "writing document");
    let bytes = to_vec(root, options)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.tag.as_str());
    for (key, value) in element.attributes.iter() {
        start.push_attribute((key, value));
    }

    let text = element.text.as_deref().filter(|t| !t.is_empty());
    if element.children.is_empty() && text.is_none() {
        return writer.write_event(Event::Empty(start)).map_err(Error::xml);
    }

    writer.write_event(Event::Start(start)).map_err(Error::xml)?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(Error::xml)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.tag.as_str())))
        .map_err(Error::xml)
}
