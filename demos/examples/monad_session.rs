// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted editing session.
//!
//! Drives a hierarchy the way an interactive editor would: one walk per tick, a
//! pointer picker standing in for the mouse, and deletions that settle over
//! the following ticks.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_examples --example monad_session`

use kurbo::Point;
use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_monad::{
    ClickKind, EditMode, NodeId, PointerPicker, SelectionResult, Tree, TreeError,
};

fn describe(tree: &Tree, result: &SelectionResult) -> String {
    let name = |n: Option<NodeId>| n.and_then(|n| tree.name(n)).unwrap_or("-").to_string();
    format!(
        "click={:?} node={} container={} link={}",
        result.click,
        name(result.node),
        name(result.container),
        result.link.is_some()
    )
}

fn main() -> Result<(), TreeError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let mut tree = Tree::new();
    let god = tree.add_root("Monad 0");
    tree.set_position(god, Point::new(400.0, 300.0))?;

    tree.add_node_at(god, Point::new(600.0, 500.0))?;
    tree.add_node_at(god, Point::new(200.0, 400.0))?;
    let c = tree.add_node_at(god, Point::new(350.0, 200.0))?;
    tree.add_node_at(c, Point::new(100.0, 100.0))?;
    let example = tree.add_node_at(god, Point::new(400.0, 400.0))?;
    let e0 = tree.add_node_at(example, Point::new(440.0, 410.0))?;
    let e1 = tree.add_node_at(example, Point::new(400.0, 450.0))?;
    let e2 = tree.add_node_at(example, Point::new(500.0, 500.0))?;

    // Focus on the top level and click on the example container.
    let focus = 1;
    let mut picker = PointerPicker::new(Point::new(402.0, 398.0));
    let result = tree.walk(god, focus, ClickKind::Primary, &mut picker);
    info!("tick 1: {}", describe(&tree, &result));
    if let Some(selected) = result.node {
        let depth = tree.depth(selected).unwrap_or_default();
        info!("mode: {:?}", EditMode::of(depth, focus));
    }

    // Children of a focused container are in linking range.
    tree.add_link(example, e0, e1)?;
    tree.add_link(example, e1, e2)?;
    tree.add_link(example, e2, e2)?;
    match tree.add_link(example, e0, e1) {
        Err(TreeError::DuplicateLink { .. }) => info!("second E0 -> E1 refused"),
        other => info!("unexpected: {other:?}"),
    }

    // Hover the E0 -> E1 link anchor.
    picker.pointer = Point::new(426.0, 424.0);
    picker.radius = 8.0;
    let result = tree.walk(god, focus, ClickKind::Primary, &mut picker);
    info!("tick 2: {}", describe(&tree, &result));

    tree.rename(e1, "a name that is far too long to be kept in full")?;
    info!("renamed to {:?}", tree.name(e1).unwrap_or_default());

    // Delete E1: its links go first, the node one tick later.
    tree.request_full_deletion(e1)?;
    picker.pointer = Point::new(-1000.0, -1000.0);
    for tick in 3..=5 {
        let (_, summary) = tree.walk_with_summary(god, focus, ClickKind::None, &mut picker);
        info!(
            "tick {tick}: {} links and {} nodes removed, {} left in Example",
            summary.links_removed,
            summary.nodes_removed,
            tree.child_count(example)
        );
    }

    // Break E2's remaining self-loop but keep the node.
    tree.request_link_only_deletion(e2)?;
    tree.walk(god, focus, ClickKind::None, &mut picker);
    info!("links left in Example: {}", tree.links(example).count());
    tree.assert_integrity();
    Ok(())
}
