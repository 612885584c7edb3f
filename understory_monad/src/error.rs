// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable errors reported by [`Tree`](crate::Tree) mutations.

use thiserror::Error;

use crate::types::{LinkId, NodeId};

/// Errors from structural edits.
///
/// Ring corruption is not represented here: it indicates a defect in the ring
/// primitive and panics instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The node handle is stale or was never issued by this tree.
    #[error("node {0:?} is not alive")]
    DeadNode(NodeId),

    /// The link handle is stale or was never issued by this tree.
    #[error("link {0:?} is not alive")]
    DeadLink(LinkId),

    /// The owner already holds a link with the same ordered endpoints.
    #[error("link {start:?} -> {end:?} already exists in {owner:?}")]
    DuplicateLink {
        /// Owner that was asked to hold the link.
        owner: NodeId,
        /// Requested start.
        start: NodeId,
        /// Requested end.
        end: NodeId,
        /// The link that is already there.
        existing: LinkId,
    },

    /// Neither endpoint is a direct child of the owner.
    #[error("neither {start:?} nor {end:?} is a child of {owner:?}")]
    DetachedLink {
        /// Owner that was asked to hold the link.
        owner: NodeId,
        /// Requested start.
        start: NodeId,
        /// Requested end.
        end: NodeId,
    },

    /// Roots have no parent to remove them, so they cannot enter full deletion.
    #[error("root {0:?} cannot be scheduled for deletion")]
    RootDeletion(NodeId),
}
