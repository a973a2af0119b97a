//! Parent/child forest of the analyses in a document.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use super::Analysis;
use crate::core::PropertyContainer;
use crate::util::{Error, Result};

/// One analysis in the forest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisNode {
    /// Analysis `ID`.
    pub id: i64,
    /// Analysis `Name`, empty if unset.
    pub name: String,
    /// `Kind` text as read, empty if unset.
    pub kind: String,
    /// Children in document order.
    pub children: Vec<AnalysisNode>,
}

/// Analyses grouped by `ParentID`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisTree {
    roots: Vec<AnalysisNode>,
}

struct Entry {
    id: i64,
    parent: Option<i64>,
    name: String,
    kind: String,
}

impl AnalysisTree {
    /// Build the forest.
    ///
    /// An analysis without a parent, or whose parent is not in `analyses`, is
    /// a root. Duplicate IDs and parent cycles are rejected.
    pub fn build(analyses: &[Analysis]) -> Result<Self> {
        let mut entries = Vec::with_capacity(analyses.len());
        let mut seen = HashSet::new();
        for analysis in analyses {
            let id = analysis.id()?;
            if !seen.insert(id) {
                return Err(Error::invalid(format!("duplicate analysis ID {id}")));
            }
            entries.push(Entry {
                id,
                parent: analysis.parent_id()?,
                name: analysis.name().unwrap_or_default(),
                kind: analysis.store().text(Analysis::KIND).unwrap_or_default().to_string(),
            });
        }

        let mut children: HashMap<i64, Vec<usize>> = HashMap::new();
        let mut root_indices = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            match entry.parent {
                Some(parent) if seen.contains(&parent) => children.entry(parent).or_default().push(index),
                _ => root_indices.push(index),
            }
        }

        let mut placed = HashSet::new();
        let roots = root_indices
            .into_iter()
            .map(|index| Self::node(&entries, &children, index, &mut placed))
            .collect();

        if placed.len() != entries.len() {
            let stuck: Vec<String> = entries
                .iter()
                .filter(|e| !placed.contains(&e.id))
                .map(|e| e.id.to_string())
                .collect();
            return Err(Error::invalid(format!(
                "parent cycle among analyses {}",
                stuck.join(", ")
            )));
        }
        Ok(Self { roots })
    }

    fn node(
        entries: &[Entry],
        children: &HashMap<i64, Vec<usize>>,
        index: usize,
        placed: &mut HashSet<i64>,
    ) -> AnalysisNode {
        let entry = &entries[index];
        placed.insert(entry.id);
        AnalysisNode {
            id: entry.id,
            name: entry.name.clone(),
            kind: entry.kind.clone(),
            children: children
                .get(&entry.id)
                .into_iter()
                .flatten()
                .map(|&child| Self::node(entries, children, child, placed))
                .collect(),
        }
    }

    /// Root analyses in document order.
    pub fn roots(&self) -> &[AnalysisNode] {
        &self.roots
    }

    /// Total number of analyses.
    pub fn len(&self) -> usize {
        fn count(node: &AnalysisNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    /// Check if the forest has no analyses.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Indented outline, one analysis per line.
    pub fn render(&self) -> String {
        fn walk(out: &mut String, node: &AnalysisNode, depth: usize) {
            let _ = writeln!(
                out,
                "{:indent$}[{}] {} ({})",
                "",
                node.id,
                node.name,
                node.kind,
                indent = depth * 2
            );
            for child in &node.children {
                walk(out, child, depth + 1);
            }
        }

        let mut out = String::new();
        for root in &self.roots {
            walk(&mut out, root, 0);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisKind;

    fn analysis(id: i64, parent: Option<i64>) -> Analysis {
        let mut a = Analysis::new(id, &format!("A{id}"), AnalysisKind::Seep);
        a.set_parent_id(parent).unwrap();
        a
    }

    #[test]
    fn test_build_forest() {
        let analyses = [
            analysis(1, None),
            analysis(2, Some(1)),
            analysis(3, Some(1)),
            analysis(4, Some(2)),
            analysis(5, Some(99)),
        ];
        let tree = AnalysisTree::build(&analyses).unwrap();

        assert_eq!(tree.len(), 5);
        assert_eq!(tree.roots().iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 5]);
        let first = &tree.roots()[0];
        assert_eq!(first.children.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(first.children[0].children[0].id, 4);
    }

    #[test]
    fn test_render_outline() {
        let tree = AnalysisTree::build(&[analysis(1, None), analysis(2, Some(1))]).unwrap();
        assert_eq!(tree.render(), "[1] A1 (SEEP/W)\n  [2] A2 (SEEP/W)\n");
    }

    #[test]
    fn test_cycle_is_rejected() {
        let analyses = [analysis(1, None), analysis(2, Some(3)), analysis(3, Some(2))];
        assert!(matches!(AnalysisTree::build(&analyses), Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let analyses = [analysis(1, None), analysis(1, None)];
        assert!(matches!(AnalysisTree::build(&analyses), Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_empty() {
        let tree = AnalysisTree::build(&[]).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.render(), "");
    }
}
