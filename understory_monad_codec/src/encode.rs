// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tracing::{debug, instrument};
use understory_monad::{Link, LinkId, NodeId, Tree, TreeError};

use crate::index::{RESERVED, write_index};

/// Replace every reserved character, NUL, CR and LF in `name` with `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if RESERVED.contains(&c) || matches!(c, '\0' | '\r' | '\n') {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Encode the subtree rooted at `root` as a single token.
///
/// Each link is written by its owner. The descriptor's jump counts the levels
/// from the owner up to the lowest node shared by the owner's path and the far
/// endpoint's path, both taken from `root`. The same link therefore encodes
/// differently depending on which container owns it:
///
/// ```rust
/// use understory_monad::Tree;
/// use understory_monad_codec::encode;
///
/// // R { A { A0 }, B }
/// let mut tree = Tree::new();
/// let r = tree.add_root("R");
/// let a = tree.add_node(r).unwrap();
/// let b = tree.add_node(r).unwrap();
/// let a0 = tree.add_node(a).unwrap();
///
/// // Owned by A: local A0, climb 1 to R, one turn to B.
/// let inner = tree.add_link(a, a0, b).unwrap();
/// assert!(encode(&tree, r).unwrap().contains(":\"!>\"\"\"\";]"));
///
/// // Owned by R: local B, no climb, turns A then A0, and `?` since A0 is the start.
/// assert!(tree.remove_link(inner, a));
/// tree.add_link(r, a0, b).unwrap();
/// assert!(encode(&tree, r).unwrap().ends_with(":\"\">\"!\"!\"!?;]"));
/// ```
///
/// Links whose far endpoint lies outside `root`'s subtree cannot be addressed
/// relatively and are left out.
#[instrument(level = "trace", skip(tree))]
pub fn encode(tree: &Tree, root: NodeId) -> Result<String, TreeError> {
    if !tree.is_alive(root) {
        return Err(TreeError::DeadNode(root));
    }
    let mut encoder = Encoder {
        tree,
        root,
        out: String::new(),
        path: Vec::new(),
    };
    encoder.subtree();
    Ok(encoder.out)
}

struct Encoder<'a> {
    tree: &'a Tree,
    root: NodeId,
    out: String,
    /// From `root` down to the node being written.
    path: Vec<NodeId>,
}

impl Encoder<'_> {
    /// Write `root`'s block, keeping one children iterator per open block.
    fn subtree(&mut self) {
        let tree = self.tree;
        self.open(self.root);
        let mut pending = vec![tree.children(self.root)];
        while let Some(children) = pending.last_mut() {
            if let Some(child) = children.next() {
                self.open(child);
                pending.push(tree.children(child));
            } else {
                pending.pop();
                self.close();
            }
        }
    }

    fn open(&mut self, node: NodeId) {
        self.path.push(node);
        self.out.push('[');
        self.out
            .push_str(&sanitize_name(self.tree.name(node).unwrap_or_default()));
        self.out.push(':');
    }

    /// Link section and `]` of the innermost open block.
    fn close(&mut self) {
        let tree = self.tree;
        let Some(&node) = self.path.last() else {
            return;
        };
        self.out.push(':');
        if tree.child_count(node) > 0 {
            for id in tree.links(node) {
                if let Some(link) = tree.link(id) {
                    self.descriptor(node, id, link);
                }
            }
        }
        self.out.push(']');
        self.path.pop();
    }

    fn descriptor(&mut self, owner: NodeId, id: LinkId, link: Link) {
        let tree = self.tree;
        if !tree.is_alive(link.start) || !tree.is_alive(link.end) {
            debug!(?id, "skipping link with a dead endpoint");
            return;
        }
        let (local, far, reversed) = if tree.parent(link.start) == Some(owner) {
            (link.start, link.end, false)
        } else {
            (link.end, link.start, true)
        };
        let Some(local_index) = tree.child_index(owner, local) else {
            debug!(?id, "skipping link without a local endpoint");
            return;
        };
        let Some(far_path) = self.path_to(far) else {
            debug!(?id, ?far, "skipping link leaving the encoded subtree");
            return;
        };
        let shared = self
            .path
            .iter()
            .zip(&far_path)
            .take_while(|(a, b)| a == b)
            .count();
        let jump = self.path.len() - shared;

        write_index(&mut self.out, local_index);
        self.out.push('>');
        write_index(&mut self.out, jump);
        for pair in far_path[shared - 1..].windows(2) {
            let turn = tree.child_index(pair[0], pair[1]).unwrap_or_default();
            write_index(&mut self.out, turn);
        }
        if reversed {
            self.out.push('?');
        }
        self.out.push(';');
    }

    /// Chain from the encode root down to `node`, or `None` outside the subtree.
    fn path_to(&self, node: NodeId) -> Option<Vec<NodeId>> {
        let mut chain = vec![node];
        let mut cur = node;
        while cur != self.root {
            cur = self.tree.parent(cur)?;
            chain.push(cur);
        }
        chain.reverse();
        Some(chain)
    }
}
