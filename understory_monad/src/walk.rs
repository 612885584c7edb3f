// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-scoped walk: hit-testing, selection, and the deferred deletion sweep.
//!
//! ## Overview
//!
//! [`Tree::walk`] runs once per interaction tick. It visits the hierarchy depth-first and
//!
//! - asks a [`Picker`] whether each eligible node or link is under the pointer,
//! - folds the answers into one [`SelectionResult`],
//! - collects link and node removals and deletion-state transitions.
//!
//! The visit only reads the tree. Everything it collected is committed right after,
//! so no ring is ever mutated while it is being iterated.
//!
//! ## Scopes
//!
//! Each node is classified against the focused depth, see [`Scope`].
//! Node hits are only considered in [`Scope::In`] and [`Scope::Sub`], and link hits
//! only for links owned by an [`Scope::In`] node. [`Scope::Out`] nodes are still
//! visited so their deletion bookkeeping makes progress.
//!
//! ## Precedence
//!
//! A link hit beats a node hit. When a child reports a link hit, the current node
//! replaces the reported node with itself, so the link's owner is what gets selected.
//! Without link hits the deepest node hit wins. The `container` of the final result
//! is the lowest ancestor strictly above the reported node.

use kurbo::Point;
use tracing::{debug, instrument};
use understory_ring::Iter;

use crate::tree::{Node, Tree};
use crate::types::{DeleteState, LinkId, NodeId};

/// Pointer button state sampled once per walk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClickKind {
    /// No button went down this tick.
    #[default]
    None,
    /// Primary (usually left) button.
    Primary,
    /// Secondary (usually right) button.
    Secondary,
}

/// Classification of a node's depth relative to the focused depth.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Ancestor of the focused level; drawn as a boundary only.
    Pre,
    /// The focused level: the node and the links it owns are hit-tested.
    In,
    /// Direct children of focused nodes; drawn as markers.
    Sub,
    /// Deeper levels; visited for bookkeeping only.
    Out,
}

impl Scope {
    /// Classify `depth` against `focus`.
    pub const fn classify(depth: u32, focus: u32) -> Self {
        if depth < focus {
            Self::Pre
        } else if depth == focus {
            Self::In
        } else if depth - focus == 1 {
            Self::Sub
        } else {
            Self::Out
        }
    }
}

/// Something the walk asks the picker about.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PickTarget {
    /// A node, with its current position.
    Node {
        /// The node.
        node: NodeId,
        /// Where the node is.
        center: Point,
    },
    /// A link, probed at its anchor point (see [`link_anchor`](crate::placement::link_anchor)).
    Link {
        /// The link.
        link: LinkId,
        /// Where the link is probed.
        anchor: Point,
    },
}

/// Collaborator that owns pointer geometry.
///
/// Closures `FnMut(PickTarget) -> bool` are pickers too.
pub trait Picker {
    /// Whether `target` is under the pointer.
    fn pick(&mut self, target: PickTarget) -> bool;

    /// Called once for every node the walk classifies as `Pre`, `In` or `Sub`,
    /// before any of its links or children. Renderers hook in here.
    fn visited(&mut self, node: NodeId, scope: Scope) {
        let _ = (node, scope);
    }
}

impl<F: FnMut(PickTarget) -> bool> Picker for F {
    fn pick(&mut self, target: PickTarget) -> bool {
        self(target)
    }
}

/// Picker that hits everything within `radius` of `pointer`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerPicker {
    /// Pointer position.
    pub pointer: Point,
    /// Hit radius around each probed point.
    pub radius: f64,
}

impl PointerPicker {
    /// Hit radius used by [`PointerPicker::new`].
    pub const DEFAULT_RADIUS: f64 = 30.0;

    /// Picker at `pointer` with [`Self::DEFAULT_RADIUS`].
    pub const fn new(pointer: Point) -> Self {
        Self {
            pointer,
            radius: Self::DEFAULT_RADIUS,
        }
    }
}

impl Picker for PointerPicker {
    fn pick(&mut self, target: PickTarget) -> bool {
        let probe = match target {
            PickTarget::Node { center, .. } => center,
            PickTarget::Link { anchor, .. } => anchor,
        };
        probe.distance(self.pointer) <= self.radius
    }
}

/// Outcome of one walk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionResult {
    /// Button state for this tick, identical for every result of the walk.
    pub click: ClickKind,
    /// Node under the pointer, or the owner of the link under the pointer.
    pub node: Option<NodeId>,
    /// Link under the pointer.
    pub link: Option<LinkId>,
    /// Lowest ancestor strictly above `node`.
    pub container: Option<NodeId>,
}

impl SelectionResult {
    /// Whether nothing was hit.
    pub fn is_empty(&self) -> bool {
        self.node.is_none() && self.link.is_none() && self.container.is_none()
    }
}

/// Editing gesture implied by the selection's depth relative to the focus.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EditMode {
    /// Selection is at the focused level; new children can be added to it.
    Adding,
    /// Selection is one level below; links can be drawn between such nodes.
    Linking,
    /// Anything else; only renaming and deletion apply.
    EditOnly,
}

impl EditMode {
    /// Mode for a selection at `selected_depth` while `focus_depth` is focused.
    pub const fn of(selected_depth: u32, focus_depth: u32) -> Self {
        match selected_depth.checked_sub(focus_depth) {
            Some(0) => Self::Adding,
            Some(1) => Self::Linking,
            _ => Self::EditOnly,
        }
    }
}

/// What a walk's commit phase changed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Links removed because an endpoint was dead or dropping its links.
    pub links_removed: usize,
    /// Nodes removed because they reached [`DeleteState::Final`].
    pub nodes_removed: usize,
    /// Deletion-state transitions applied.
    pub transitions: usize,
}

/// Mutations recorded during the visit and applied afterwards.
#[derive(Debug, Default)]
struct Sweep {
    links: Vec<(NodeId, LinkId)>,
    nodes: Vec<(NodeId, NodeId)>,
    states: Vec<(NodeId, DeleteState)>,
}

struct Scan<'a, P: ?Sized> {
    tree: &'a Tree,
    focus: u32,
    picker: &'a mut P,
    sweep: Sweep,
}

/// A node whose children are still being visited.
struct Frame<'a> {
    id: NodeId,
    node: &'a Node,
    scope: Scope,
    result: SelectionResult,
    children: Iter<'a, Node>,
}

impl Frame<'_> {
    fn merge(&mut self, sub: SelectionResult) {
        if sub.node.is_some() && self.result.link.is_none() {
            self.result = sub;
        } else if sub.link.is_some() {
            self.result.link = sub.link;
            self.result.node = Some(self.id);
        }
    }
}

impl<'a, P: Picker + ?Sized> Scan<'a, P> {
    /// Depth-first visit of `root`'s subtree.
    ///
    /// Open nodes live on an explicit stack, so depth is only bounded by memory.
    fn visit(&mut self, root: NodeId) -> SelectionResult {
        let Some(mut frame) = self.enter(root) else {
            return SelectionResult::default();
        };
        let mut open = Vec::new();
        loop {
            if let Some((key, child)) = frame.children.next() {
                let child_id = NodeId(key);
                if child.state >= DeleteState::Final {
                    self.sweep.nodes.push((frame.id, child_id));
                } else if let Some(next) = self.enter(child_id) {
                    open.push(frame);
                    frame = next;
                }
                continue;
            }
            let sub = self.leave(&frame);
            match open.pop() {
                Some(parent) => {
                    frame = parent;
                    frame.merge(sub);
                }
                None => return sub,
            }
        }
    }

    /// Hit-test `id` and its links. `None` when there is nothing to descend into.
    fn enter(&mut self, id: NodeId) -> Option<Frame<'a>> {
        let tree = self.tree;
        let node = tree.get(id)?;
        if node.state.is_full_deletion() {
            // Not drawn, not descended; the parent removes it once it is final.
            self.sweep.states.push((id, node.state.after_pass()));
            return None;
        }

        let scope = Scope::classify(node.depth, self.focus);
        let mut result = SelectionResult::default();
        if scope != Scope::Out {
            self.picker.visited(id, scope);
            let target = PickTarget::Node {
                node: id,
                center: node.position,
            };
            if scope != Scope::Pre && self.picker.pick(target) {
                result.node = Some(id);
            }
        }

        for (key, link) in tree.links.iter(node.links) {
            let link_id = LinkId(key);
            if scope == Scope::In {
                let hit = tree.anchor_of(link).is_some_and(|anchor| {
                    self.picker.pick(PickTarget::Link {
                        link: link_id,
                        anchor,
                    })
                });
                if hit {
                    result.link = Some(link_id);
                    result.node = Some(id);
                }
            }
            if tree.link_is_breaking(link) {
                self.sweep.links.push((id, link_id));
            }
        }

        Some(Frame {
            id,
            node,
            scope,
            result,
            children: tree.nodes.iter(node.children),
        })
    }

    /// Finish a node once all of its children were merged.
    fn leave(&mut self, frame: &Frame<'a>) -> SelectionResult {
        let Frame { id, node, scope, .. } = *frame;
        if node.state.breaks_links() {
            self.sweep.states.push((id, node.state.after_pass()));
        }
        if scope == Scope::Out {
            return SelectionResult::default();
        }
        let mut result = frame.result;
        if result.node.is_some() && result.node != Some(id) && result.container.is_none() {
            result.container = Some(id);
        }
        result
    }
}

impl Tree {
    /// Walk the hierarchy under `root` once, focused on `focus_depth`.
    ///
    /// Returns what is under the pointer according to `picker`, then commits the
    /// removals and deletion-state transitions the walk discovered. Never fails;
    /// a walk that hits nothing returns a result with only `click` set.
    pub fn walk<P: Picker + ?Sized>(
        &mut self,
        root: NodeId,
        focus_depth: u32,
        click: ClickKind,
        picker: &mut P,
    ) -> SelectionResult {
        self.walk_with_summary(root, focus_depth, click, picker).0
    }

    /// [`walk`](Self::walk), also reporting what the commit phase changed.
    #[instrument(level = "trace", skip(self, picker))]
    pub fn walk_with_summary<P: Picker + ?Sized>(
        &mut self,
        root: NodeId,
        focus_depth: u32,
        click: ClickKind,
        picker: &mut P,
    ) -> (SelectionResult, SweepSummary) {
        let mut scan = Scan {
            tree: self,
            focus: focus_depth,
            picker,
            sweep: Sweep::default(),
        };
        let mut result = scan.visit(root);
        let sweep = scan.sweep;
        result.click = click;
        let summary = self.commit(sweep);
        if summary.links_removed + summary.nodes_removed > 0 {
            debug!(
                links = summary.links_removed,
                nodes = summary.nodes_removed,
                "walk swept deleted entities"
            );
        }
        (result, summary)
    }

    fn commit(&mut self, sweep: Sweep) -> SweepSummary {
        let mut summary = SweepSummary::default();
        for (owner, link) in sweep.links {
            if self.remove_link(link, owner) {
                summary.links_removed += 1;
            }
        }
        for (parent, node) in sweep.nodes {
            if self.remove_node(node, parent) {
                summary.nodes_removed += 1;
            }
        }
        for (node, state) in sweep.states {
            if let Some(n) = self.nodes.get_mut(node.0) {
                n.state = state;
                summary.transitions += 1;
            }
        }
        summary
    }
}
