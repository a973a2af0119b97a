//! Analyses of a whole GeoStudio document.

use tracing::{debug, info};

use super::{Analysis, ANALYSIS_TAG};
use crate::core::{Element, PropertyContainer, LEN_ATTRIBUTE};
use crate::util::{Error, Result};

/// Tag of the analysis list under the document root.
pub const ANALYSES_TAG: &str = "Analyses";

/// Read every `Analyses/Analysis` element under `root`.
///
/// A document without an `Analyses` element has no analyses.
pub fn read_analyses(root: &Element) -> Result<Vec<Analysis>> {
    let Some(list) = root.child(ANALYSES_TAG) else {
        debug!(root = %root.tag, "document has no analyses");
        return Ok(Vec::new());
    };
    let analyses = list
        .children_named(ANALYSIS_TAG)
        .map(Analysis::from_element)
        .collect::<Result<Vec<_>>>()?;
    info!(count = analyses.len(), "analyses read");
    Ok(analyses)
}

/// Replace the `Analysis` elements under `root` with `analyses`.
///
/// Other children of the `Analyses` element are kept ahead of the written
/// analyses. The element is created if missing and its `Len` updated.
pub fn write_analyses(root: &mut Element, analyses: &[Analysis]) -> Result<()> {
    let index = match root.children.iter().position(|c| c.tag == ANALYSES_TAG) {
        Some(index) => index,
        None => {
            root.push_child(Element::new(ANALYSES_TAG));
            root.children.len() - 1
        }
    };
    let list = &mut root.children[index];
    list.children.retain(|c| c.tag != ANALYSIS_TAG);
    for analysis in analyses {
        let mut node = Element::new(ANALYSIS_TAG);
        analysis.write(&mut node)?;
        list.push_child(node);
    }
    list.set_attr(LEN_ATTRIBUTE, analyses.len().to_string());
    info!(count = analyses.len(), "analyses written");
    Ok(())
}

/// Find an analysis by ID.
pub fn find_analysis(analyses: &[Analysis], id: i64) -> Result<&Analysis> {
    for analysis in analyses {
        if analysis.id()? == id {
            return Ok(analysis);
        }
    }
    Err(Error::invalid(format!("no analysis with ID {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisKind;

    fn document() -> Element {
        Element::new("GSIData").with_child(
            Element::new(ANALYSES_TAG)
                .with_attr("Len", "2")
                .with_child(
                    Element::new(ANALYSIS_TAG)
                        .with_child(Element::with_text("ID", "1"))
                        .with_child(Element::with_text("Name", "Initial"))
                        .with_child(Element::with_text("Kind", "SEEP/W")),
                )
                .with_child(
                    Element::new(ANALYSIS_TAG)
                        .with_child(Element::with_text("ID", "2"))
                        .with_child(Element::with_text("Name", "Transient"))
                        .with_child(Element::with_text("Kind", "SEEP/W"))
                        .with_child(Element::with_text("ParentID", "1")),
                ),
        )
    }

    #[test]
    fn test_read_and_find() {
        let analyses = read_analyses(&document()).unwrap();
        assert_eq!(analyses.len(), 2);
        assert_eq!(find_analysis(&analyses, 2).unwrap().name().unwrap(), "Transient");
        assert!(matches!(find_analysis(&analyses, 7), Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_missing_list() {
        assert!(read_analyses(&Element::new("GSIData")).unwrap().is_empty());
    }

    #[test]
    fn test_write_replaces_analyses() {
        let mut root = document();
        let mut analyses = read_analyses(&root).unwrap();
        analyses.push(Analysis::new(3, "Stability", AnalysisKind::Slope));
        write_analyses(&mut root, &analyses).unwrap();

        let list = root.child(ANALYSES_TAG).unwrap();
        assert_eq!(list.attr(LEN_ATTRIBUTE), Some("3"));
        assert_eq!(list.children.len(), 3);
        assert_eq!(read_analyses(&root).unwrap()[2].kind().unwrap(), AnalysisKind::Slope);
    }

    #[test]
    fn test_write_creates_list() {
        let mut root = Element::new("GSIData");
        write_analyses(&mut root, &[Analysis::new(1, "Only", AnalysisKind::Temp)]).unwrap();
        assert_eq!(root.child(ANALYSES_TAG).and_then(|l| l.attr(LEN_ATTRIBUTE)), Some("1"));
    }
}
