//! Index-linked arena built once from the raw document.
//!
//! Nodes are never removed: collapsing hides a subtree by clearing
//! `visible_children` while `all_children` keeps the full child list. Layout
//! coordinates live directly on the nodes so a render cycle can stash the
//! previous position (`x0`/`y0`) before the next one moves them.

use std::collections::HashSet;

use crate::taxonomy::model::{Result, TaxonAttr, TaxonRecord, TaxonomyError};

/// A taxon enriched with tree links and layout state.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub id: String,
    pub name: String,
    pub attr: TaxonAttr,
    /// Distance from the root (root = 0).
    pub depth: usize,
    pub parent: Option<usize>,
    /// Full child list, fixed at build time.
    pub all_children: Vec<usize>,
    /// Children currently shown. `None` = collapsed (or leaf).
    pub visible_children: Option<Vec<usize>>,
    /// Current layout position. `x` is the sibling axis, `y` the depth axis.
    pub x: f64,
    pub y: f64,
    /// Position before the most recent layout pass.
    pub x0: f64,
    pub y0: f64,
}

impl HierarchyNode {
    pub fn has_children(&self) -> bool {
        !self.all_children.is_empty()
    }

    pub fn is_expanded(&self) -> bool {
        self.visible_children.is_some()
    }
}

/// The full hierarchy: an arena of nodes with index links, root at 0.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    pub nodes: Vec<HierarchyNode>,
}

pub const ROOT: usize = 0;

impl Hierarchy {
    /// Build the arena from a raw document, fully expanded.
    ///
    /// Fails on duplicate ids; enter/update/exit matching requires every id
    /// to be unique and stable.
    pub fn build(root: &TaxonRecord) -> Result<Self> {
        let mut hierarchy = Self::default();
        let mut seen = HashSet::new();
        hierarchy.push_subtree(root, None, 0, &mut seen)?;
        log::debug!(
            "built hierarchy: {} nodes, max depth {}",
            hierarchy.nodes.len(),
            hierarchy.max_depth()
        );
        Ok(hierarchy)
    }

    fn push_subtree(
        &mut self,
        record: &TaxonRecord,
        parent: Option<usize>,
        depth: usize,
        seen: &mut HashSet<String>,
    ) -> Result<usize> {
        if !seen.insert(record.id.clone()) {
            return Err(TaxonomyError::DuplicateId(record.id.clone()));
        }
        let idx = self.nodes.len();
        self.nodes.push(HierarchyNode {
            id: record.id.clone(),
            name: record.name.clone(),
            attr: record.attr.clone(),
            depth,
            parent,
            all_children: Vec::new(),
            visible_children: None,
            x: 0.0,
            y: 0.0,
            x0: 0.0,
            y0: 0.0,
        });

        let mut children = Vec::with_capacity(record.children.len());
        for child in &record.children {
            children.push(self.push_subtree(child, Some(idx), depth + 1, seen)?);
        }
        if !children.is_empty() {
            self.nodes[idx].visible_children = Some(children.clone());
            self.nodes[idx].all_children = children;
        }
        Ok(idx)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Toggle a node between collapsed and expanded.
    ///
    /// `all_children` is never touched; only the visible set flips. Leaves
    /// are a no-op (nothing to show or hide).
    pub fn toggle(&mut self, idx: usize) {
        if !self.nodes[idx].has_children() {
            return;
        }
        self.nodes[idx].visible_children = match self.nodes[idx].visible_children {
            Some(_) => None,
            None => Some(self.nodes[idx].all_children.clone()),
        };
    }

    /// Indices of all visible nodes, pre-order from the root.
    pub fn visible(&self) -> Vec<usize> {
        let mut out = Vec::new();
        if self.nodes.is_empty() {
            return out;
        }
        let mut stack = vec![ROOT];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            if let Some(children) = &self.nodes[idx].visible_children {
                // reversed so pre-order pops left-to-right
                for &child in children.iter().rev() {
                    stack.push(child);
                }
            }
        }
        out
    }

    /// Visible parent→child links, in parent pre-order.
    pub fn visible_links(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for idx in self.visible() {
            if let Some(children) = &self.nodes[idx].visible_children {
                for &child in children {
                    out.push((idx, child));
                }
            }
        }
        out
    }

    /// Overwrite every visible node's previous position with its current one.
    ///
    /// This is the baseline the next render cycle animates from.
    pub fn stash_positions(&mut self) {
        for idx in self.visible() {
            let node = &mut self.nodes[idx];
            node.x0 = node.x;
            node.y0 = node.y;
        }
    }
}
