// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: nodes, links, and deletion requests.

use kurbo::Point;
use tracing::{debug, instrument, trace};
use understory_ring::{Key, RingArena};

use crate::error::TreeError;
use crate::placement::{link_anchor, spiral_offset};
use crate::types::{DeleteState, LinkFlags, LinkId, NodeId, truncate_name};

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Hierarchy of nodes, each holding a ring of children and a ring of links.
pub struct Tree {
    pub(crate) nodes: RingArena<Node>,
    pub(crate) links: RingArena<Link>,
    roots: Option<Key>,
}

impl core::fmt::Debug for Tree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("roots", &self.nodes.len_of(self.roots))
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) position: Point,
    pub(crate) depth: u32,
    pub(crate) state: DeleteState,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<Key>,
    pub(crate) links: Option<Key>,
}

impl Node {
    fn new(name: String, position: Point, depth: u32, parent: Option<NodeId>) -> Self {
        Self {
            name,
            position,
            depth,
            state: DeleteState::Off,
            parent,
            children: None,
            links: None,
        }
    }
}

/// A directed edge stored in its owner's link ring.
///
/// At least one endpoint is a direct child of `owner`. The other endpoint may live
/// anywhere in the same hierarchy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    /// Node whose link ring holds this edge.
    pub owner: NodeId,
    /// Start of the edge.
    pub start: NodeId,
    /// End of the edge.
    pub end: NodeId,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: RingArena::new(),
            links: RingArena::new(),
            roots: None,
        }
    }

    /// Create a depth-0 node at the origin.
    pub fn add_root(&mut self, name: &str) -> NodeId {
        let node = Node::new(truncate_name(name), Point::ORIGIN, 0, None);
        let id = NodeId(self.nodes.insert(&mut self.roots, node));
        debug!(?id, name, "added root");
        id
    }

    /// Add a child to `parent`, placed on the parent's placement spiral.
    ///
    /// The child is named after its predecessor in the ring (`A`, `B`, ...).
    pub fn add_node(&mut self, parent: NodeId) -> Result<NodeId, TreeError> {
        let origin = self.position(parent).ok_or(TreeError::DeadNode(parent))?;
        let slot = self.child_count(parent);
        self.add_node_at(parent, origin + spiral_offset(slot))
    }

    /// Add a child to `parent` at an explicit position.
    #[instrument(level = "trace", skip(self))]
    pub fn add_node_at(&mut self, parent: NodeId, position: Point) -> Result<NodeId, TreeError> {
        let p = self.get(parent).ok_or(TreeError::DeadNode(parent))?;
        let depth = p.depth + 1;
        let mut head = p.children;
        let name = self.default_name(head);
        let node = Node::new(name, position, depth, Some(parent));
        let id = NodeId(self.nodes.insert(&mut head, node));
        self.set_children_head(parent, head);
        Ok(id)
    }

    /// Detach `node` from `parent` and free its whole subtree.
    ///
    /// Every descendant and every link owned anywhere in the subtree is freed,
    /// whatever its deletion state. Returns `false` when `node` is not a direct
    /// child of `parent`.
    pub fn remove_node(&mut self, node: NodeId, parent: NodeId) -> bool {
        let Some(p) = self.get(parent) else {
            return false;
        };
        let mut head = p.children;
        let Some(removed) = self.nodes.unlink(&mut head, node.0) else {
            return false;
        };
        self.set_children_head(parent, head);
        let freed = self.free_subtree(removed);
        debug!(?node, ?parent, freed, "removed node");
        true
    }

    /// Whether `b` is in `a`'s sibling ring. A node is its own sibling.
    pub fn is_sibling(&self, a: NodeId, b: NodeId) -> bool {
        self.nodes.iter(Some(a.0)).any(|(k, _)| k == b.0)
    }

    /// Add a directed link `start -> end` to `owner`'s link ring.
    ///
    /// At least one endpoint must be a direct child of `owner`. A second link with
    /// the same ordered endpoints is refused with [`TreeError::DuplicateLink`], which
    /// names the link that is already there.
    pub fn add_link(
        &mut self,
        owner: NodeId,
        start: NodeId,
        end: NodeId,
    ) -> Result<LinkId, TreeError> {
        self.check_link(owner, start, end, None)?;
        let mut head = self.get(owner).and_then(|o| o.links);
        let id = LinkId(self.links.insert(&mut head, Link { owner, start, end }));
        if let Some(o) = self.nodes.get_mut(owner.0) {
            o.links = head;
        }
        trace!(?owner, ?start, ?end, ?id, "added link");
        Ok(id)
    }

    /// Remove `link` from `owner`'s link ring. Returns `false` when `owner` does not hold it.
    pub fn remove_link(&mut self, link: LinkId, owner: NodeId) -> bool {
        let Some(o) = self.get(owner) else {
            return false;
        };
        let mut head = o.links;
        let removed = self.links.unlink(&mut head, link.0).is_some();
        if removed {
            if let Some(o) = self.nodes.get_mut(owner.0) {
                o.links = head;
            }
            trace!(?link, ?owner, "removed link");
        }
        removed
    }

    /// Point an existing link at a different end node.
    pub fn retarget_link(&mut self, link: LinkId, end: NodeId) -> Result<(), TreeError> {
        let current = self.link(link).ok_or(TreeError::DeadLink(link))?;
        self.check_link(current.owner, current.start, end, Some(link))?;
        if let Some(l) = self.links.get_mut(link.0) {
            l.end = end;
        }
        Ok(())
    }

    /// Rename a node. Names longer than [`MAX_NAME_CHARS`](crate::MAX_NAME_CHARS) are truncated.
    pub fn rename(&mut self, node: NodeId, name: &str) -> Result<(), TreeError> {
        let n = self.nodes.get_mut(node.0).ok_or(TreeError::DeadNode(node))?;
        n.name = truncate_name(name);
        Ok(())
    }

    /// Move a node.
    pub fn set_position(&mut self, node: NodeId, position: Point) -> Result<(), TreeError> {
        let n = self.nodes.get_mut(node.0).ok_or(TreeError::DeadNode(node))?;
        n.position = position;
        Ok(())
    }

    /// Schedule `node` and its subtree for removal.
    ///
    /// The next walk sweeps every link touching the subtree; the walk after that
    /// removes `node` from its parent.
    pub fn request_full_deletion(&mut self, node: NodeId) -> Result<(), TreeError> {
        let n = self.get(node).ok_or(TreeError::DeadNode(node))?;
        if n.parent.is_none() {
            return Err(TreeError::RootDeletion(node));
        }
        let mut stack = vec![node];
        let mut marked = 0_usize;
        while let Some(id) = stack.pop() {
            stack.extend(self.children(id));
            if let Some(n) = self.nodes.get_mut(id.0) {
                n.state = n.state.max(DeleteState::PreLink);
                marked += 1;
            }
        }
        debug!(?node, marked, "full deletion requested");
        Ok(())
    }

    /// Schedule every link touching `node` for removal, keeping the node itself.
    pub fn request_link_only_deletion(&mut self, node: NodeId) -> Result<(), TreeError> {
        let n = self.nodes.get_mut(node.0).ok_or(TreeError::DeadNode(node))?;
        if !n.state.is_full_deletion() {
            n.state = DeleteState::OnlyLink;
        }
        debug!(?node, "link-only deletion requested");
        Ok(())
    }

    // --- queries ---

    /// Whether `node` refers to a live node.
    pub fn is_alive(&self, node: NodeId) -> bool {
        self.nodes.is_alive(node.0)
    }

    /// Whether `link` refers to a live link.
    pub fn is_link_alive(&self, link: LinkId) -> bool {
        self.links.is_alive(link.0)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Display name.
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(|n| n.name.as_str())
    }

    /// Depth below the root; roots are `0`.
    pub fn depth(&self, node: NodeId) -> Option<u32> {
        self.get(node).map(|n| n.depth)
    }

    /// Position.
    pub fn position(&self, node: NodeId) -> Option<Point> {
        self.get(node).map(|n| n.position)
    }

    /// Containing node, or `None` for roots.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    /// Current deletion state.
    pub fn delete_state(&self, node: NodeId) -> Option<DeleteState> {
        self.get(node).map(|n| n.state)
    }

    /// Roots in creation order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter(self.roots).map(|(k, _)| NodeId(k))
    }

    /// Children of `node` in ring order, starting at the ring head.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let head = self.get(node).and_then(|n| n.children);
        self.nodes.iter(head).map(|(k, _)| NodeId(k))
    }

    /// Number of direct children.
    pub fn child_count(&self, node: NodeId) -> usize {
        self.nodes.len_of(self.get(node).and_then(|n| n.children))
    }

    /// Child at ring position `index`.
    pub fn nth_child(&self, node: NodeId, index: usize) -> Option<NodeId> {
        let head = self.get(node)?.children;
        self.nodes.nth(head, index).map(NodeId)
    }

    /// Ring position of `child` among `parent`'s children.
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        let head = self.get(parent)?.children;
        self.nodes.position(head, child.0)
    }

    /// Links owned by `node` in ring order.
    pub fn links(&self, node: NodeId) -> impl Iterator<Item = LinkId> + '_ {
        let head = self.get(node).and_then(|n| n.links);
        self.links.iter(head).map(|(k, _)| LinkId(k))
    }

    /// Owner and endpoints of `link`.
    pub fn link(&self, link: LinkId) -> Option<Link> {
        self.links.get(link.0).copied()
    }

    /// Classification of `link` for renderers.
    pub fn link_flags(&self, link: LinkId) -> Option<LinkFlags> {
        let l = self.links.get(link.0)?;
        let mut flags = LinkFlags::empty();
        flags.set(LinkFlags::SELF_LOOP, l.start == l.end);
        flags.set(LinkFlags::CROSS_CATEGORY, !self.is_sibling(l.end, l.start));
        flags.set(LinkFlags::BREAKING, self.link_is_breaking(l));
        Some(flags)
    }

    /// Check every ring reachable from the roots, plus parent and depth bookkeeping.
    ///
    /// # Panics
    ///
    /// Panics on any structural violation.
    pub fn assert_integrity(&self) {
        self.nodes.assert_ring(self.roots);
        let mut stack: Vec<NodeId> = self.roots().collect();
        while let Some(id) = stack.pop() {
            let node = self.get(id).expect("reachable node is alive");
            self.nodes.assert_ring(node.children);
            self.links.assert_ring(node.links);
            for (_, link) in self.links.iter(node.links) {
                assert_eq!(link.owner, id, "link stored under the wrong owner");
            }
            for child in self.children(id) {
                assert_eq!(self.parent(child), Some(id), "child has the wrong parent");
                assert_eq!(
                    self.depth(child),
                    Some(node.depth + 1),
                    "child depth is not parent depth + 1"
                );
                stack.push(child);
            }
        }
    }

    // --- internals ---

    pub(crate) fn get(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node.0)
    }

    /// Whether the walk should sweep `link`: an endpoint is gone or is dropping its links.
    pub(crate) fn link_is_breaking(&self, link: &Link) -> bool {
        [link.start, link.end]
            .into_iter()
            .any(|id| self.get(id).is_none_or(|n| n.state.breaks_links()))
    }

    pub(crate) fn anchor_of(&self, link: &Link) -> Option<Point> {
        let start = self.position(link.start)?;
        let end = self.position(link.end)?;
        Some(link_anchor(start, end, link.start == link.end))
    }

    fn set_children_head(&mut self, parent: NodeId, head: Option<Key>) {
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children = head;
        }
    }

    fn default_name(&self, head: Option<Key>) -> String {
        let last = head
            .and_then(|h| self.nodes.prev(h))
            .and_then(|k| self.nodes.get(k))
            .and_then(|n| n.name.chars().next());
        let letter = match last {
            Some(c) => char::from_u32(u32::from(c) + 1).unwrap_or('A'),
            None => 'A',
        };
        letter.to_string()
    }

    fn check_link(
        &self,
        owner: NodeId,
        start: NodeId,
        end: NodeId,
        replacing: Option<LinkId>,
    ) -> Result<(), TreeError> {
        for id in [owner, start, end] {
            if !self.is_alive(id) {
                return Err(TreeError::DeadNode(id));
            }
        }
        if self.parent(start) != Some(owner) && self.parent(end) != Some(owner) {
            return Err(TreeError::DetachedLink { owner, start, end });
        }
        let head = self.get(owner).and_then(|o| o.links);
        let existing = self
            .links
            .iter(head)
            .find(|(k, l)| l.start == start && l.end == end && Some(LinkId(*k)) != replacing);
        if let Some((k, _)) = existing {
            debug!(?owner, ?start, ?end, "link already exists");
            return Err(TreeError::DuplicateLink {
                owner,
                start,
                end,
                existing: LinkId(k),
            });
        }
        Ok(())
    }

    fn free_subtree(&mut self, node: Node) -> usize {
        let mut pending = vec![node];
        let mut freed = 0;
        while let Some(mut node) = pending.pop() {
            self.links.drain(&mut node.links);
            pending.extend(self.nodes.drain(&mut node.children));
            freed += 1;
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// R { A { A0, A1 }, B }
    fn sample() -> (Tree, [NodeId; 5]) {
        let mut tree = Tree::new();
        let r = tree.add_root("R");
        let a = tree.add_node(r).unwrap();
        let b = tree.add_node(r).unwrap();
        let a0 = tree.add_node(a).unwrap();
        let a1 = tree.add_node(a).unwrap();
        (tree, [r, a, b, a0, a1])
    }

    #[test]
    fn add_node_sets_depth_parent_and_default_names() {
        let (tree, [r, a, b, a0, a1]) = sample();
        assert_eq!(tree.depth(r), Some(0));
        assert_eq!(tree.depth(a), Some(1));
        assert_eq!(tree.depth(a1), Some(2));
        assert_eq!(tree.parent(a0), Some(a));
        assert_eq!(tree.name(a), Some("A"));
        assert_eq!(tree.name(b), Some("B"));
        assert_eq!(tree.name(a0), Some("A"));
        assert_eq!(tree.name(a1), Some("B"));
        assert_eq!(tree.children(r).collect::<Vec<_>>(), vec![a, b]);
        tree.assert_integrity();
    }

    #[test]
    fn add_node_rejects_dead_parent() {
        let (mut tree, [r, a, ..]) = sample();
        assert!(tree.remove_node(a, r));
        assert_eq!(tree.add_node(a), Err(TreeError::DeadNode(a)));
    }

    #[test]
    fn children_spread_on_spiral() {
        let (tree, [r, a, b, ..]) = sample();
        let pr = tree.position(r).unwrap();
        let pa = tree.position(a).unwrap();
        let pb = tree.position(b).unwrap();
        assert!(pa.distance(pr) > 1.0);
        assert!(pa.distance(pb) > 1.0);
    }

    #[test]
    fn remove_node_frees_subtree_and_owned_links() {
        let (mut tree, [r, a, b, a0, a1]) = sample();
        tree.add_link(a, a0, a1).unwrap();
        tree.add_link(r, a, b).unwrap();
        assert!(tree.remove_node(a, r));
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(a0));
        assert!(!tree.is_alive(a1));
        assert_eq!(tree.node_count(), 2);
        // The link owned by R survives the removal; the walk sweeps it later.
        assert_eq!(tree.link_count(), 1);
        assert_eq!(tree.children(r).collect::<Vec<_>>(), vec![b]);
        tree.assert_integrity();
    }

    #[test]
    fn remove_node_requires_direct_child() {
        let (mut tree, [r, a, _, a0, _]) = sample();
        assert!(!tree.remove_node(a0, r));
        assert!(tree.is_alive(a0));
        assert!(tree.remove_node(a0, a));
        assert!(!tree.remove_node(a0, a), "second removal is a no-op");
    }

    #[test]
    fn rings_survive_interleaved_adds_and_removes() {
        let mut tree = Tree::new();
        let r = tree.add_root("R");
        let mut live = Vec::new();
        for round in 0..40 {
            let id = tree.add_node(r).unwrap();
            live.push(id);
            if round % 3 == 2 {
                let victim = live.remove(round % live.len());
                assert!(tree.remove_node(victim, r));
            }
            assert_eq!(tree.child_count(r), live.len());
            tree.assert_integrity();
        }
        let ring: Vec<_> = tree.children(r).collect();
        assert!(live.iter().all(|id| ring.contains(id)));
    }

    #[test]
    fn siblings_share_a_ring() {
        let (tree, [r, a, b, a0, a1]) = sample();
        assert!(tree.is_sibling(a, b));
        assert!(tree.is_sibling(a0, a1));
        assert!(tree.is_sibling(a, a));
        assert!(!tree.is_sibling(a, a0));
        assert!(!tree.is_sibling(b, a1));
        assert!(tree.is_sibling(r, r));
    }

    #[test]
    fn duplicate_links_are_refused() {
        let (mut tree, [r, a, b, ..]) = sample();
        let first = tree.add_link(r, a, b).unwrap();
        let second = tree.add_link(r, a, b);
        assert_eq!(
            second,
            Err(TreeError::DuplicateLink {
                owner: r,
                start: a,
                end: b,
                existing: first,
            })
        );
        assert_eq!(tree.links(r).count(), 1);
        // The reverse direction is a different link.
        assert!(tree.add_link(r, b, a).is_ok());
        assert_eq!(tree.links(r).count(), 2);
    }

    #[test]
    fn links_need_a_local_endpoint() {
        let (mut tree, [r, a, b, a0, a1]) = sample();
        assert_eq!(
            tree.add_link(r, a0, a1),
            Err(TreeError::DetachedLink {
                owner: r,
                start: a0,
                end: a1
            })
        );
        // Cross-depth: A0 is local to A, B lives one level up.
        assert!(tree.add_link(a, a0, b).is_ok());
        // Cross-depth the other way round: B is local to R.
        assert!(tree.add_link(r, a0, b).is_ok());
    }

    #[test]
    fn remove_link_checks_owner() {
        let (mut tree, [r, a, _, a0, a1]) = sample();
        let l = tree.add_link(a, a0, a1).unwrap();
        assert!(!tree.remove_link(l, r));
        assert!(tree.remove_link(l, a));
        assert!(!tree.is_link_alive(l));
        assert!(!tree.remove_link(l, a));
    }

    #[test]
    fn retarget_moves_end_and_refuses_duplicates() {
        let (mut tree, [r, a, b, ..]) = sample();
        let ab = tree.add_link(r, a, b).unwrap();
        let aa = tree.add_link(r, a, a).unwrap();
        assert!(matches!(
            tree.retarget_link(ab, a),
            Err(TreeError::DuplicateLink { existing, .. }) if existing == aa
        ));
        tree.remove_link(aa, r);
        tree.retarget_link(ab, a).unwrap();
        assert_eq!(tree.link(ab).unwrap().end, a);
    }

    #[test]
    fn link_flags_classify_edges() {
        let (mut tree, [r, a, b, a0, _]) = sample();
        let self_loop = tree.add_link(r, a, a).unwrap();
        let cross = tree.add_link(a, a0, b).unwrap();
        let plain = tree.add_link(r, a, b).unwrap();
        assert_eq!(tree.link_flags(self_loop), Some(LinkFlags::SELF_LOOP));
        assert_eq!(tree.link_flags(cross), Some(LinkFlags::CROSS_CATEGORY));
        assert_eq!(tree.link_flags(plain), Some(LinkFlags::empty()));
        tree.request_link_only_deletion(b).unwrap();
        assert!(tree.link_flags(plain).unwrap().contains(LinkFlags::BREAKING));
    }

    #[test]
    fn rename_truncates() {
        let (mut tree, [_, a, ..]) = sample();
        tree.rename(a, &"x".repeat(64)).unwrap();
        assert_eq!(tree.name(a).unwrap().len(), crate::MAX_NAME_CHARS);
    }

    #[test]
    fn full_deletion_marks_subtree_and_refuses_roots() {
        let (mut tree, [r, a, b, a0, a1]) = sample();
        assert_eq!(tree.request_full_deletion(r), Err(TreeError::RootDeletion(r)));
        tree.request_full_deletion(a).unwrap();
        for id in [a, a0, a1] {
            assert_eq!(tree.delete_state(id), Some(DeleteState::PreLink));
        }
        assert_eq!(tree.delete_state(b), Some(DeleteState::Off));
        // Link-only never downgrades a pending full deletion.
        tree.request_link_only_deletion(a).unwrap();
        assert_eq!(tree.delete_state(a), Some(DeleteState::PreLink));
    }
}
