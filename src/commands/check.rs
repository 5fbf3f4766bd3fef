//! `taxtree check` — load and validate a taxonomy document.

use std::path::Path;

use anyhow::{Context, Result};

use crate::taxonomy::hierarchy::Hierarchy;
use crate::taxonomy::model;

pub fn run(file: &Path) -> Result<()> {
    let record = model::load(file)
        .with_context(|| format!("failed to load {}", file.display()))?;
    let hierarchy = Hierarchy::build(&record)
        .with_context(|| format!("invalid taxonomy in {}", file.display()))?;

    for line in summary_lines(&hierarchy) {
        println!("  {}", line);
    }
    Ok(())
}

fn summary_lines(hierarchy: &Hierarchy) -> Vec<String> {
    let leaves = hierarchy
        .nodes
        .iter()
        .filter(|n| !n.has_children())
        .count();
    let flagged = hierarchy.nodes.iter().filter(|n| n.attr.nsclc).count();
    vec![
        format!("nodes     : {}", hierarchy.len()),
        format!("leaves    : {}", leaves),
        format!("max depth : {}", hierarchy.max_depth()),
        format!("NSCLC     : {}", flagged),
        "ids       : unique".to_string(),
    ]
}
