// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placeholder geometry: where new nodes go and where a link is probed.
//!
//! Real layout belongs to the renderer. These helpers only give nodes distinct,
//! deterministic positions so that hit-testing collaborators have something to work with.

use kurbo::{Point, Vec2};

/// Radius of the first slot on the placement spiral.
pub const SPIRAL_BASE_RADIUS: f64 = 40.0;

/// Radius added per slot on the placement spiral.
pub const SPIRAL_STEP: f64 = 12.0;

/// Fraction of the way from start to end where a link is probed.
pub const LINK_ANCHOR_LERP: f64 = 0.35;

/// Offset from the node at which a self-loop is probed.
pub const SELF_LOOP_OFFSET: Vec2 = Vec2::new(15.0, 15.0);

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Offset of the `slot`-th child from its parent on a golden-angle spiral.
pub fn spiral_offset(slot: usize) -> Vec2 {
    #[allow(
        clippy::cast_precision_loss,
        reason = "Slot counts far below 2^52 are exact."
    )]
    let t = slot as f64;
    Vec2::from_angle(t * GOLDEN_ANGLE) * (SPIRAL_BASE_RADIUS + SPIRAL_STEP * t)
}

/// Point probed when hit-testing a link between `start` and `end`.
pub fn link_anchor(start: Point, end: Point, self_loop: bool) -> Point {
    if self_loop {
        start + SELF_LOOP_OFFSET
    } else {
        start.lerp(end, LINK_ANCHOR_LERP)
    }
}
