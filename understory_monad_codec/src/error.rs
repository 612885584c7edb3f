// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;
use understory_monad::{NodeId, TreeError};

/// What was wrong with a token.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedText {
    /// The token stopped in the middle of a block or descriptor.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// A structural character was missing.
    #[error("expected {expected:?}, found {found:?}")]
    Unexpected {
        /// The character the grammar required.
        expected: char,
        /// The character that was there instead.
        found: char,
    },

    /// A character that is not an index digit appeared inside an index.
    #[error("{0:?} is not an index digit")]
    InvalidDigit(char),

    /// An index does not fit in `usize`.
    #[error("index does not fit in usize")]
    Overflow,

    /// A child index points past the end of a ring.
    #[error("no child at index {index}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
    },

    /// A jump climbs above the decoded subtree.
    #[error("jump of {jump} leaves the decoded subtree")]
    JumpOutOfRange {
        /// The offending jump count.
        jump: usize,
    },

    /// Text continues after the outermost block.
    #[error("trailing input after the outermost block")]
    TrailingInput,

    /// The container to decode into is not alive.
    #[error("target {0:?} is not alive")]
    DeadTarget(NodeId),

    /// The tree refused a decoded link.
    #[error("link rejected: {0}")]
    Link(TreeError),
}

/// A failed [`decode`](crate::decode).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("malformed token at byte {offset}: {kind}")]
pub struct DecodeError {
    /// What went wrong.
    pub kind: MalformedText,
    /// Byte offset into the text passed to `decode`.
    pub offset: usize,
    /// Root of the nodes created before the failure, if any were and they were kept.
    pub partial: Option<NodeId>,
}
