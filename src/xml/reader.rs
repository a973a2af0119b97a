//! XML text to [`Element`] tree.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::core::Element;
use crate::util::{Error, Result};

/// Parse a whole document and return its root element.
///
/// Declarations, comments, processing instructions and whitespace-only text
/// are dropped. Text and CDATA are unescaped and concatenated per element.
pub fn parse_str(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(Error::xml)? {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::invalid("closing tag without opening tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(Error::xml)?;
                append_text(&mut stack, &text);
            }
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned())?;
                append_text(&mut stack, &text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::invalid(format!("element <{}> is never closed", open.tag)));
    }
    root.ok_or_else(|| Error::invalid("document has no root element"))
}

/// Read and parse a document from disk.
pub fn read_file(path: impl AsRef<Path>) -> Result<Element> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading document");
    let xml = fs::read_to_string(path)?;
    parse_str(&xml)
}

fn open_element(start: &BytesStart<'_>) -> Result<Element> {
    let tag = String::from_utf8(start.name().as_ref().to_vec())?;
    let mut element = Element::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(Error::xml)?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())?;
        let value = attr.unescape_value().map_err(Error::xml)?;
        element.set_attr(key, value.into_owned());
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(Error::invalid(format!(
            "second root element <{}>",
            element.tag
        )));
    }
    *root = Some(element);
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) {
    // Text outside the root element carries no data
    let Some(current) = stack.last_mut() else {
        return;
    };
    match &mut current.text {
        Some(existing) => existing.push_str(text),
        None => current.text = Some(text.to_string()),
    }
}
