//! Enter/update/exit reconciliation between the hierarchy and the drawn
//! diagram, plus the transition clock that animates each cycle.
//!
//! Every cycle is anchored on a *source* node (the one whose toggle
//! triggered it): entering sprites start at the source's previous position,
//! exiting sprites collapse toward its new position, surviving sprites move
//! from wherever they currently are. A cycle started mid-animation samples
//! the in-flight positions as its starting state, superseding the old
//! transition.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::layout::{Extent, TreeLayout};
use crate::taxonomy::hierarchy::Hierarchy;

/// How a sprite relates to the current data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Enter,
    Update,
    Exit,
}

/// One drawn node, keyed by the taxon id.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: String,
    /// Arena index. Exiting nodes are hidden, not deleted, so the index
    /// stays valid for label data.
    pub idx: usize,
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub phase: Phase,
}

/// One drawn parent→child edge, keyed by the child id.
#[derive(Debug, Clone)]
pub struct SceneLink {
    pub child_id: String,
    pub from: ((f64, f64), (f64, f64)),
    pub to: ((f64, f64), (f64, f64)),
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy)]
struct Transition {
    start: Instant,
    duration: Duration,
}

impl Transition {
    /// Eased progress in `[0, 1]`.
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        ease_cubic_in_out((elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0))
    }

    fn done(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }
}

/// Cubic in/out easing, the default register of the source transitions.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_point(a: (f64, f64), b: (f64, f64), t: f64) -> (f64, f64) {
    (lerp(a.0, b.0, t), lerp(a.1, b.1, t))
}

/// A node resolved to screen-space world coordinates for one frame.
#[derive(Debug, Clone)]
pub struct NodeSprite {
    pub idx: usize,
    pub x: f64,
    pub y: f64,
    pub opacity: f64,
    pub exiting: bool,
}

/// A link resolved for one frame.
#[derive(Debug, Clone)]
pub struct LinkSprite {
    pub source: (f64, f64),
    pub target: (f64, f64),
    pub opacity: f64,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct SceneFrame {
    pub nodes: Vec<NodeSprite>,
    pub links: Vec<LinkSprite>,
    pub extent: Extent,
}

/// Persistent diagram state across render cycles.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    links: Vec<SceneLink>,
    transition: Option<Transition>,
    extent_from: Option<Extent>,
    extent_to: Option<Extent>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.transition.map(|t| !t.done(now)).unwrap_or(false)
    }

    /// Run one render cycle: relayout, diff by id, schedule the transition,
    /// then stash every visible node's position as the next baseline.
    pub fn advance(
        &mut self,
        hierarchy: &mut Hierarchy,
        layout: &TreeLayout,
        source: usize,
        duration: Duration,
        now: Instant,
    ) {
        // Sample the in-flight state before anything moves.
        let t = self
            .transition
            .map(|tr| tr.progress(now))
            .unwrap_or(1.0);
        let mut prev_nodes: HashMap<String, (f64, f64)> = HashMap::new();
        for node in &self.nodes {
            prev_nodes.insert(node.id.clone(), lerp_point(node.from, node.to, t));
        }
        let mut prev_links: HashMap<String, ((f64, f64), (f64, f64))> = HashMap::new();
        for link in &self.links {
            prev_links.insert(
                link.child_id.clone(),
                (
                    lerp_point(link.from.0, link.to.0, t),
                    lerp_point(link.from.1, link.to.1, t),
                ),
            );
        }

        let source_prev = (hierarchy.nodes[source].x0, hierarchy.nodes[source].y0);
        let extent = layout.compute(hierarchy);
        let source_new = (hierarchy.nodes[source].x, hierarchy.nodes[source].y);

        let visible = hierarchy.visible();
        let mut next_nodes = Vec::with_capacity(visible.len());
        for &idx in &visible {
            let node = &hierarchy.nodes[idx];
            let to = (node.x, node.y);
            let (phase, from) = match prev_nodes.get(&node.id) {
                Some(&pos) => (Phase::Update, pos),
                None => (Phase::Enter, source_prev),
            };
            next_nodes.push(SceneNode {
                id: node.id.clone(),
                idx,
                from,
                to,
                phase,
            });
        }
        // Sprites whose hierarchy entry disappeared collapse toward the
        // source's new position and fade out.
        let kept: HashSet<String> = next_nodes.iter().map(|n| n.id.clone()).collect();
        for old in &self.nodes {
            if kept.contains(&old.id) {
                continue;
            }
            if let Some(&pos) = prev_nodes.get(&old.id) {
                next_nodes.push(SceneNode {
                    id: old.id.clone(),
                    idx: old.idx,
                    from: pos,
                    to: source_new,
                    phase: Phase::Exit,
                });
            }
        }

        let links = hierarchy.visible_links();
        let mut next_links = Vec::with_capacity(links.len());
        for (parent, child) in links {
            let child_id = hierarchy.nodes[child].id.clone();
            let to = (
                (hierarchy.nodes[parent].x, hierarchy.nodes[parent].y),
                (hierarchy.nodes[child].x, hierarchy.nodes[child].y),
            );
            let (phase, from) = match prev_links.get(&child_id) {
                Some(&ends) => (Phase::Update, ends),
                None => (Phase::Enter, (source_prev, source_prev)),
            };
            next_links.push(SceneLink {
                child_id,
                from,
                to,
                phase,
            });
        }
        let kept_links: HashSet<String> = next_links.iter().map(|l| l.child_id.clone()).collect();
        for old in &self.links {
            if kept_links.contains(&old.child_id) {
                continue;
            }
            if let Some(&ends) = prev_links.get(&old.child_id) {
                next_links.push(SceneLink {
                    child_id: old.child_id.clone(),
                    from: ends,
                    to: (source_new, source_new),
                    phase: Phase::Exit,
                });
            }
        }

        self.nodes = next_nodes;
        self.links = next_links;
        // the viewport also resumes from its interpolated state
        self.extent_from = match (self.extent_from, self.extent_to) {
            (Some(a), Some(b)) => Some(Extent {
                min_x: lerp(a.min_x, b.min_x, t),
                max_x: lerp(a.max_x, b.max_x, t),
            }),
            (_, Some(b)) => Some(b),
            _ => Some(extent),
        };
        self.extent_to = Some(extent);
        self.transition = Some(Transition {
            start: now,
            duration,
        });

        hierarchy.stash_positions();
        log::debug!(
            "render cycle: {} nodes, {} links, extent {:.1}, {:?}",
            self.nodes.len(),
            self.links.len(),
            extent.height(),
            duration
        );
    }

    /// Resolve the scene at `now`, dropping finished exit sprites.
    pub fn frame(&mut self, now: Instant) -> SceneFrame {
        let t = self
            .transition
            .map(|tr| tr.progress(now))
            .unwrap_or(1.0);
        let done = self.transition.map(|tr| tr.done(now)).unwrap_or(true);
        if done {
            self.nodes.retain(|n| n.phase != Phase::Exit);
            self.links.retain(|l| l.phase != Phase::Exit);
        }

        let nodes = self
            .nodes
            .iter()
            .map(|n| {
                let (x, y) = lerp_point(n.from, n.to, t);
                NodeSprite {
                    idx: n.idx,
                    x,
                    y,
                    opacity: opacity_for(n.phase, t),
                    exiting: n.phase == Phase::Exit,
                }
            })
            .collect();
        let links = self
            .links
            .iter()
            .map(|l| LinkSprite {
                source: lerp_point(l.from.0, l.to.0, t),
                target: lerp_point(l.from.1, l.to.1, t),
                opacity: opacity_for(l.phase, t),
            })
            .collect();

        let extent = match (self.extent_from, self.extent_to) {
            (Some(a), Some(b)) => Extent {
                min_x: lerp(a.min_x, b.min_x, t),
                max_x: lerp(a.max_x, b.max_x, t),
            },
            (_, Some(b)) => b,
            _ => Extent {
                min_x: 0.0,
                max_x: 0.0,
            },
        };

        SceneFrame {
            nodes,
            links,
            extent,
        }
    }

    #[cfg(test)]
    fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

fn opacity_for(phase: Phase, t: f64) -> f64 {
    match phase {
        Phase::Enter => t,
        Phase::Update => 1.0,
        Phase::Exit => 1.0 - t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::model::parse;

    const DUR: Duration = Duration::from_millis(250);

    fn hierarchy() -> Hierarchy {
        let doc = parse(
            r#"{
                "id": "root", "name": "r",
                "children": [
                    {"id": "a", "name": "a", "children": [
                        {"id": "a1", "name": "a1"},
                        {"id": "a2", "name": "a2"}
                    ]},
                    {"id": "b", "name": "b"}
                ]
            }"#,
        )
        .unwrap();
        Hierarchy::build(&doc).unwrap()
    }

    fn index_of(h: &Hierarchy, id: &str) -> usize {
        h.nodes.iter().position(|n| n.id == id).unwrap()
    }

    #[test]
    fn first_cycle_enters_everything_from_the_root_anchor() {
        let mut h = hierarchy();
        let layout = TreeLayout::default();
        let mut scene = Scene::new();
        let t0 = Instant::now();
        scene.advance(&mut h, &layout, 0, DUR, t0);

        for node in &scene.nodes {
            assert_eq!(node.phase, Phase::Enter);
            assert_eq!(node.from, (0.0, 0.0), "root x0/y0 starts at origin");
        }
        assert_eq!(scene.nodes.len(), 5);
        assert_eq!(scene.links.len(), 4);
    }

    #[test]
    fn stash_invariant_holds_after_every_cycle() {
        let mut h = hierarchy();
        let layout = TreeLayout::default();
        let mut scene = Scene::new();
        let t0 = Instant::now();
        scene.advance(&mut h, &layout, 0, DUR, t0);
        for &idx in &h.visible() {
            assert_eq!(h.nodes[idx].x0, h.nodes[idx].x);
            assert_eq!(h.nodes[idx].y0, h.nodes[idx].y);
        }

        let a = index_of(&h, "a");
        h.toggle(a);
        scene.advance(&mut h, &layout, a, DUR, t0 + DUR);
        for &idx in &h.visible() {
            assert_eq!(h.nodes[idx].x0, h.nodes[idx].x);
            assert_eq!(h.nodes[idx].y0, h.nodes[idx].y);
        }
    }

    #[test]
    fn collapse_exits_hidden_nodes_toward_the_source() {
        let mut h = hierarchy();
        let layout = TreeLayout::default();
        let mut scene = Scene::new();
        let t0 = Instant::now();
        scene.advance(&mut h, &layout, 0, DUR, t0);

        let a = index_of(&h, "a");
        let a_prev = (h.nodes[a].x0, h.nodes[a].y0);
        h.toggle(a);
        scene.advance(&mut h, &layout, a, DUR, t0 + DUR);

        let a_new = (h.nodes[a].x, h.nodes[a].y);
        let exiting = scene.node("a1").expect("a1 should linger as an exit sprite");
        assert_eq!(exiting.phase, Phase::Exit);
        assert_eq!(exiting.to, a_new);
        // it starts from its old resting place, not the anchor
        assert_ne!(exiting.from, a_prev);
    }

    #[test]
    fn expand_enters_children_at_the_sources_previous_position() {
        let mut h = hierarchy();
        let layout = TreeLayout::default();
        let mut scene = Scene::new();
        let t0 = Instant::now();
        scene.advance(&mut h, &layout, 0, DUR, t0);

        let a = index_of(&h, "a");
        h.toggle(a); // collapse
        scene.advance(&mut h, &layout, a, DUR, t0 + DUR);
        let _ = scene.frame(t0 + DUR * 2); // settle, prune exits

        let a_prev = (h.nodes[a].x0, h.nodes[a].y0);
        h.toggle(a); // expand again
        scene.advance(&mut h, &layout, a, DUR, t0 + DUR * 3);

        let entering = scene.node("a1").expect("a1 re-enters");
        assert_eq!(entering.phase, Phase::Enter);
        assert_eq!(entering.from, a_prev);
    }

    #[test]
    fn toggle_twice_restores_sprite_counts_after_settling() {
        let mut h = hierarchy();
        let layout = TreeLayout::default();
        let mut scene = Scene::new();
        let t0 = Instant::now();
        scene.advance(&mut h, &layout, 0, DUR, t0);
        let frame = scene.frame(t0 + DUR * 2);
        let (nodes_before, links_before) = (frame.nodes.len(), frame.links.len());

        let a = index_of(&h, "a");
        h.toggle(a);
        scene.advance(&mut h, &layout, a, DUR, t0 + DUR * 3);
        h.toggle(a);
        scene.advance(&mut h, &layout, a, DUR, t0 + DUR * 6);

        let frame = scene.frame(t0 + DUR * 9);
        assert_eq!(frame.nodes.len(), nodes_before);
        assert_eq!(frame.links.len(), links_before);
    }

    #[test]
    fn exit_sprites_fade_and_are_pruned_when_done() {
        let mut h = hierarchy();
        let layout = TreeLayout::default();
        let mut scene = Scene::new();
        let t0 = Instant::now();
        scene.advance(&mut h, &layout, 0, DUR, t0);

        let a = index_of(&h, "a");
        h.toggle(a);
        scene.advance(&mut h, &layout, a, DUR, t0 + DUR);

        let mid = scene.frame(t0 + DUR + DUR / 2);
        let fading = mid
            .nodes
            .iter()
            .find(|n| n.exiting)
            .expect("exit sprite mid-flight");
        assert!(fading.opacity < 1.0 && fading.opacity > 0.0);

        let settled = scene.frame(t0 + DUR * 3);
        assert!(settled.nodes.iter().all(|n| !n.exiting));
        assert_eq!(settled.nodes.len(), 3); // root, a, b
    }

    #[test]
    fn mid_animation_toggle_resumes_from_interpolated_positions() {
        let mut h = hierarchy();
        let layout = TreeLayout::default();
        let mut scene = Scene::new();
        let t0 = Instant::now();
        scene.advance(&mut h, &layout, 0, DUR, t0);
        let _ = scene.frame(t0 + DUR * 2);

        let a = index_of(&h, "a");
        let b = index_of(&h, "b");
        let b_rest = (h.nodes[b].x, h.nodes[b].y);
        h.toggle(a); // b starts drifting as the layout contracts
        scene.advance(&mut h, &layout, a, DUR, t0 + DUR * 3);
        let b_target = scene.node("b").unwrap().to;
        assert_ne!(b_rest, b_target);

        // supersede halfway through: cubic in/out is exactly 0.5 at t = 0.5
        let halfway = lerp_point(b_rest, b_target, 0.5);
        h.toggle(a);
        scene.advance(&mut h, &layout, a, DUR, t0 + DUR * 3 + DUR / 2);
        let resumed = scene.node("b").unwrap();
        assert!((resumed.from.0 - halfway.0).abs() < 1e-6);
        assert!((resumed.from.1 - halfway.1).abs() < 1e-6);
    }

    #[test]
    fn easing_endpoints_and_midpoint() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!((ease_cubic_in_out(0.5) - 0.5).abs() < 1e-12);
        assert!(ease_cubic_in_out(0.25) < 0.25);
        assert!(ease_cubic_in_out(0.75) > 0.75);
    }
}
