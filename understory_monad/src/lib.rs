// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_monad --heading-base-level=0

//! Understory Monad: an unbounded hierarchy of containers with links between siblings.
//!
//! Every node ("monad") is a container. It holds a ring of child nodes and a ring of
//! directed links whose endpoints include at least one of those children.
//!
//! - [`Tree`] owns all nodes and links in two generational ring arenas from [`understory_ring`].
//! - [`DeleteState`] stages removals over consecutive walks, so nothing referenced by a
//!   link is freed before the link is gone.
//! - [`Tree::walk`] visits the hierarchy once per interaction tick, hit-tests through a
//!   [`Picker`] collaborator, aggregates a [`SelectionResult`], and commits pending
//!   deletions afterwards.
//!
//! Rendering, input capture, and real layout are left to collaborators. Nodes carry a
//! placeholder position (see [`placement`]) so a picker has something to test against.
//!
//! ## API overview
//!
//! - [`Tree::add_root`], [`Tree::add_node`], [`Tree::remove_node`], [`Tree::is_sibling`]
//! - [`Tree::add_link`], [`Tree::remove_link`], [`Tree::retarget_link`]
//! - [`Tree::request_full_deletion`], [`Tree::request_link_only_deletion`]
//! - [`Tree::walk`] with [`Scope`], [`ClickKind`], [`PickTarget`], [`PointerPicker`]
//!
//! ## Deletion protocol
//!
//! Links live in their owner's ring, not on their endpoints, so a node cannot find the
//! links that point at it. Instead, deletion is a flag that every owner checks:
//!
//! 1. [`Tree::request_full_deletion`] marks the node and its subtree [`DeleteState::PreLink`].
//! 2. The next walk removes every link touching a marked node and advances the node to
//!    [`DeleteState::Final`].
//! 3. The walk after that removes the node from its parent.
//!
//! # Example
//!
//! ```rust
//! use understory_monad::{ClickKind, PickTarget, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.add_root("Monad 0");
//! let a = tree.add_node(root).unwrap();
//! let b = tree.add_node(root).unwrap();
//! let ab = tree.add_link(root, a, b).unwrap();
//!
//! // Focus on the root's level and pretend the pointer sits on the link.
//! let mut picker = |t: PickTarget| matches!(t, PickTarget::Link { link, .. } if link == ab);
//! let hit = tree.walk(root, 0, ClickKind::Primary, &mut picker);
//! assert_eq!(hit.link, Some(ab));
//! assert_eq!(hit.node, Some(root));
//!
//! // Delete B: its link goes on the next walk, the node on the one after.
//! tree.request_full_deletion(b).unwrap();
//! let mut nothing = |_: PickTarget| false;
//! tree.walk(root, 0, ClickKind::None, &mut nothing);
//! assert!(!tree.is_link_alive(ab));
//! assert!(tree.is_alive(b));
//! tree.walk(root, 0, ClickKind::None, &mut nothing);
//! assert!(!tree.is_alive(b));
//! ```

mod error;
pub mod placement;
mod tree;
mod types;
mod walk;

pub use error::TreeError;
pub use tree::{Link, Tree};
pub use types::{DeleteState, LinkFlags, LinkId, MAX_NAME_CHARS, NodeId, truncate_name};
pub use walk::{
    ClickKind, EditMode, PickTarget, Picker, PointerPicker, Scope, SelectionResult, SweepSummary,
};
