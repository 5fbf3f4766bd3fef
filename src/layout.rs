//! Fixed-node-size tidy tree layout.
//!
//! Assigns a position to every *visible* node: adjacent leaves sit `dx`
//! apart on the sibling axis, each depth level sits `dy` further along the
//! depth axis, and every internal node is centered between its first and
//! last visible child. Collapsed subtrees take no space, so folding a branch
//! shrinks the diagram's extent; callers re-derive the viewport from the
//! reported extent after every pass.

use crate::taxonomy::hierarchy::{Hierarchy, ROOT};

/// Sibling/level spacing configuration.
#[derive(Debug, Clone, Copy)]
pub struct TreeLayout {
    /// Spacing between adjacent leaves on the sibling axis.
    pub dx: f64,
    /// Spacing between depth levels.
    pub dy: f64,
}

/// Min/max sibling-axis coordinates across visible nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub max_x: f64,
}

impl Extent {
    /// Sibling-axis span of the visible diagram; the viewport height
    /// before margins.
    pub fn height(&self) -> f64 {
        self.max_x - self.min_x
    }
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self { dx: 3.0, dy: 24.0 }
    }
}

impl TreeLayout {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Lay out all visible nodes in place and return their extent.
    ///
    /// Hidden nodes keep whatever coordinates they last had; they are not
    /// part of the extent.
    pub fn compute(&self, hierarchy: &mut Hierarchy) -> Extent {
        if hierarchy.is_empty() {
            return Extent {
                min_x: 0.0,
                max_x: 0.0,
            };
        }
        let mut next_leaf = 0usize;
        self.place(hierarchy, ROOT, &mut next_leaf);

        let mut extent = Extent {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
        };
        for idx in hierarchy.visible() {
            let x = hierarchy.nodes[idx].x;
            extent.min_x = extent.min_x.min(x);
            extent.max_x = extent.max_x.max(x);
        }
        extent
    }

    fn place(&self, hierarchy: &mut Hierarchy, idx: usize, next_leaf: &mut usize) {
        let children = hierarchy.nodes[idx].visible_children.clone();
        let x = match children {
            Some(children) if !children.is_empty() => {
                for &child in &children {
                    self.place(hierarchy, child, next_leaf);
                }
                let first = hierarchy.nodes[children[0]].x;
                let last = hierarchy.nodes[children[children.len() - 1]].x;
                (first + last) / 2.0
            }
            _ => {
                let x = *next_leaf as f64 * self.dx;
                *next_leaf += 1;
                x
            }
        };
        let node = &mut hierarchy.nodes[idx];
        node.x = x;
        node.y = node.depth as f64 * self.dy;
    }
}
