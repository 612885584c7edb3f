// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Copy and paste a subtree through its text token.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_examples --example codec_clipboard`

use tracing_subscriber::EnvFilter;
use understory_monad::Tree;
use understory_monad_codec::{DecodeOptions, decode, encode};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let mut tree = Tree::new();
    let god = tree.add_root("Monad 0");
    let r = tree.add_node(god)?;
    tree.rename(r, "Room")?;
    let a = tree.add_node(r)?;
    let b = tree.add_node(r)?;
    let a0 = tree.add_node(a)?;
    let a1 = tree.add_node(a)?;
    tree.add_link(a, a0, a1)?;
    tree.add_link(a, a0, b)?;
    tree.add_link(r, a1, b)?;
    tree.add_link(r, b, b)?;

    // "Copy".
    let clipboard = format!("{}\n", encode(&tree, r)?);
    println!("token: {}", clipboard.trim_end());

    // "Paste" twice under the root.
    for _ in 0..2 {
        let copy = decode(&mut tree, &clipboard, god, &DecodeOptions::default())?;
        println!(
            "pasted {:?}: {} children, same token: {}",
            tree.name(copy).unwrap_or_default(),
            tree.child_count(copy),
            encode(&tree, copy)? == clipboard.trim_end()
        );
    }

    // A clipped token fails; rollback leaves nothing behind.
    let before = tree.node_count();
    let options = DecodeOptions {
        rollback_on_error: true,
        ..DecodeOptions::default()
    };
    let clipped: String = clipboard.chars().take(clipboard.len() / 2).collect();
    match decode(&mut tree, &clipped, god, &options) {
        Ok(_) => println!("clipped token decoded?"),
        Err(e) => println!("clipped token: {e}"),
    }
    assert_eq!(tree.node_count(), before);
    Ok(())
}
