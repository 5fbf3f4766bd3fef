//! `taxtree list` — print every taxon in document order.

use std::path::Path;

use anyhow::{Context, Result};

use crate::taxonomy::hierarchy::Hierarchy;
use crate::taxonomy::model;

pub fn run(file: &Path) -> Result<()> {
    let record = model::load(file)
        .with_context(|| format!("failed to load {}", file.display()))?;
    let hierarchy = Hierarchy::build(&record)?;

    for line in list_lines(&hierarchy) {
        println!("{}", line);
    }
    Ok(())
}

/// One indented line per taxon, pre-order, with codes where present.
fn list_lines(hierarchy: &Hierarchy) -> Vec<String> {
    hierarchy
        .visible()
        .into_iter()
        .map(|idx| {
            let node = &hierarchy.nodes[idx];
            let indent = "  ".repeat(node.depth);
            let mut line = format!("{}{} [{}]", indent, node.name, node.id);
            if !node.attr.morphology_code.is_empty() {
                line.push_str(&format!("  M:{}", node.attr.morphology_code));
            }
            if !node.attr.topography_code.is_empty() {
                line.push_str(&format!("  T:{}", node.attr.topography_code));
            }
            if node.attr.nsclc {
                line.push_str("  NSCLC");
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::model::parse;

    #[test]
    fn lines_are_preorder_and_indented() {
        let doc = parse(
            r#"{
                "id": "r", "name": "root",
                "children": [
                    {"id": "a", "name": "child",
                     "attr": {"morphology_code": "8140/3", "NSCLC": true},
                     "children": [{"id": "a1", "name": "grandchild"}]},
                    {"id": "b", "name": "sibling", "attr": {"topography_code": "C34"}}
                ]
            }"#,
        )
        .unwrap();
        let hierarchy = Hierarchy::build(&doc).unwrap();
        let lines = list_lines(&hierarchy);
        assert_eq!(lines[0], "root [r]");
        assert_eq!(lines[1], "  child [a]  M:8140/3  NSCLC");
        assert_eq!(lines[2], "    grandchild [a1]");
        assert_eq!(lines[3], "  sibling [b]  T:C34");
    }
}
