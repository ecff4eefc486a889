//! Alignment guides shown while a zone is dragged or resized.
//!
//! Guides are advisory: they are painted but never snap geometry.

#[cfg(test)]
#[path = "guides_test.rs"]
mod guides_test;

use crate::config::EditorConfig;
use crate::doc::{EntityId, Zone};
use crate::geom::{Rect, intersection_area};

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// A vertical line at `x = pos`, spanning `from..to` in y.
    Vertical,
    /// A horizontal line at `y = pos`, spanning `from..to` in x.
    Horizontal,
}

/// A guide segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub axis: Axis,
    pub pos: f64,
    pub from: f64,
    pub to: f64,
}

/// Guides between `moving` (the prospective rectangle of zone `moving_id`)
/// and every other zone it overlaps by at least the configured ratio of its
/// own area. One guide per aligned edge, left/right/top/bottom in that order.
#[must_use]
pub fn alignment_guides(moving: Rect, moving_id: &EntityId, zones: &[Zone], config: &EditorConfig) -> Vec<Guide> {
    let mut out = Vec::new();
    let required = moving.area() * config.guide_overlap_ratio;
    let tol = config.guide_tolerance;

    for other in zones.iter().filter(|z| &z.id != moving_id) {
        let r = other.rect();
        if intersection_area(moving, r) < required {
            continue;
        }
        let (y0, y1) = (moving.y.min(r.y), moving.bottom().max(r.bottom()));
        let (x0, x1) = (moving.x.min(r.x), moving.right().max(r.right()));

        let edges = [
            (Axis::Vertical, moving.x, r.x, y0, y1),
            (Axis::Vertical, moving.right(), r.right(), y0, y1),
            (Axis::Horizontal, moving.y, r.y, x0, x1),
            (Axis::Horizontal, moving.bottom(), r.bottom(), x0, x1),
        ];
        for (axis, mine, theirs, from, to) in edges {
            if (mine - theirs).abs() <= tol {
                out.push(Guide { axis, pos: theirs, from, to });
            }
        }
    }
    out
}
