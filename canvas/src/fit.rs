//! Auto-fit: a zone's rectangle derived from the blocks assigned to it.

#[cfg(test)]
#[path = "fit_test.rs"]
mod fit_test;

use crate::config::EditorConfig;
use crate::geom::Rect;

/// Compute the fitted rectangle for a zone whose members occupy `members`.
///
/// Returns `None` when there are no members; an empty zone keeps its last
/// explicit rectangle. Otherwise the members' bounding box is grown by the
/// fit padding on every side, its top-left floored at 0, and its size raised
/// to the zone minimum. The right and bottom edges stay put when the
/// top-left is floored.
#[must_use]
pub fn fitted_rect<I>(members: I, config: &EditorConfig) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    let mut iter = members.into_iter();
    let first = iter.next()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.right(), first.bottom());
    for r in iter {
        min_x = min_x.min(r.x);
        min_y = min_y.min(r.y);
        max_x = max_x.max(r.right());
        max_y = max_y.max(r.bottom());
    }

    let pad = config.fit_padding;
    let x = (min_x - pad).max(0.0);
    let y = (min_y - pad).max(0.0);
    let w = (max_x + pad - x).max(config.zone_min_w);
    let h = (max_y + pad - y).max(config.zone_min_h);
    Some(Rect::new(x, y, w, h))
}
