// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the hierarchy: handles, deletion states, link flags, and names.

use understory_ring::Key;

/// Identifier for a node (a container) in the [`Tree`](crate::Tree).
///
/// This is a small, copyable generational handle. It stays valid until the node is
/// removed; afterwards it is stale and never aliases a node created later in the same slot.
/// Use [`Tree::is_alive`](crate::Tree::is_alive) to check liveness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) Key);

/// Identifier for a directed link owned by a node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct LinkId(pub(crate) Key);

/// Longest display name, in characters. Longer names are truncated on assignment.
pub const MAX_NAME_CHARS: usize = 31;

/// Staged-removal state stored on every node.
///
/// The variants are ordered; comparisons such as `state >= DeleteState::PostOnlyLink`
/// are how the walk decides what to sweep.
///
/// - Full deletion starts at [`PreLink`](Self::PreLink). The first walk that visits the
///   node advances it to [`Final`](Self::Final) and every link touching it is swept in
///   that same walk. The next walk removes the node from its parent.
/// - Link-only deletion starts at [`OnlyLink`](Self::OnlyLink). Each walk sweeps the
///   node's links and steps the state back towards [`Off`](Self::Off).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeleteState {
    /// Not scheduled for anything.
    #[default]
    Off,
    /// Last pass of a link-only deletion; links touching the node are still swept.
    PostOnlyLink,
    /// Link-only deletion requested.
    OnlyLink,
    /// Full deletion requested; links touching the node are swept.
    PreLink,
    /// Links are gone; the parent removes the node on the next walk.
    Final,
}

impl DeleteState {
    /// Whether links touching a node in this state are swept.
    pub const fn breaks_links(self) -> bool {
        self as u8 >= Self::PostOnlyLink as u8
    }

    /// Whether the node is on its way to removal.
    pub const fn is_full_deletion(self) -> bool {
        self as u8 >= Self::PreLink as u8
    }

    /// State after a walk has visited a node in this state.
    pub const fn after_pass(self) -> Self {
        match self {
            Self::Off | Self::PostOnlyLink => Self::Off,
            Self::OnlyLink => Self::PostOnlyLink,
            Self::PreLink | Self::Final => Self::Final,
        }
    }
}

bitflags::bitflags! {
    /// Derived classification of a link, used by renderers and the walk.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LinkFlags: u8 {
        /// Start and end are the same node.
        const SELF_LOOP      = 0b0000_0001;
        /// The end is not a sibling of the start.
        const CROSS_CATEGORY = 0b0000_0010;
        /// An endpoint is dead or scheduled to drop its links; the next walk sweeps it.
        const BREAKING       = 0b0000_0100;
    }
}

/// Clamp `name` to [`MAX_NAME_CHARS`] characters.
pub fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_CHARS).collect()
}
