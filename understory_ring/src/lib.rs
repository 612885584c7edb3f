// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_ring --heading-base-level=0

//! Understory Ring: circular doubly-linked rings stored in a generational arena.
//!
//! Understory Ring is the storage primitive underneath `understory_monad`.
//!
//! - Many rings share one [`RingArena`]; each ring is named by an `Option<Key>` head owned by the caller.
//! - An empty ring is an absent head. There is no sentinel entry.
//! - Entries are addressed by generational [`Key`]s, so a stale key never aliases a reused slot.
//!
//! Insertion always happens immediately before the head, which makes ring order from the head equal to
//! insertion order. Removal fixes up the head when the removed entry was the head.
//!
//! # Example
//!
//! ```rust
//! use understory_ring::RingArena;
//!
//! let mut arena = RingArena::new();
//! let mut head = None;
//! let a = arena.insert(&mut head, 'a');
//! let b = arena.insert(&mut head, 'b');
//! let c = arena.insert(&mut head, 'c');
//!
//! // Ring order from the head is insertion order.
//! let order: Vec<char> = arena.iter(head).map(|(_, v)| *v).collect();
//! assert_eq!(order, ['a', 'b', 'c']);
//! assert_eq!(arena.next(c), Some(a));
//!
//! // Removing the head promotes its successor.
//! assert_eq!(arena.unlink(&mut head, a), Some('a'));
//! assert_eq!(head, Some(b));
//! assert_eq!(arena.assert_ring(head), 2);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod arena;

pub use arena::{Iter, Key, RingArena};
