// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_monad_codec --heading-base-level=0

//! Understory Monad Codec: a subtree of an [`understory_monad::Tree`] as one text token.
//!
//! A node is written as `[name:children:links]`. Children are nested blocks in ring order.
//! Links are only written for nodes with children, each as a descriptor
//!
//! ```text
//! <local> > <jump> <turn>* [?] ;
//! ```
//!
//! without the spaces. `local` is the ring index of the endpoint that is a child of the
//! owner. The other endpoint is found by climbing `jump` levels from the owner and then
//! descending through each `turn` child index. A trailing `?` means that far endpoint is
//! the link's start. No identifiers are stored: every address is relative to where the
//! descriptor sits, so a token can be pasted under any container.
//!
//! Indices use the digit alphabet in [`index`].
//!
//! Decoding runs two passes over the text. The first creates every node; the second
//! resolves descriptors once all positional indices are stable.
//!
//! # Example
//!
//! ```rust
//! use understory_monad::Tree;
//! use understory_monad_codec::{DecodeOptions, decode, encode};
//!
//! let mut tree = Tree::new();
//! let root = tree.add_root("R");
//! let a = tree.add_node(root).unwrap();
//! let b = tree.add_node(root).unwrap();
//! let a0 = tree.add_node(a).unwrap();
//! tree.add_link(a, a0, b).unwrap();
//!
//! let token = encode(&tree, root).unwrap();
//!
//! // Paste a copy next to the original.
//! let copy = decode(&mut tree, &token, root, &DecodeOptions::default()).unwrap();
//! assert_eq!(tree.parent(copy), Some(root));
//! assert_eq!(encode(&tree, copy).unwrap(), token);
//! ```

mod decode;
mod encode;
mod error;
pub mod index;

pub use decode::{DecodeOptions, decode};
pub use encode::{encode, sanitize_name};
pub use error::{DecodeError, MalformedText};
