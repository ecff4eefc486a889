//! Plain geometry in canvas-pixel space.
//!
//! Origin is top-left, x grows right and y grows down. Every rectangle is
//! axis-aligned and described by its top-left corner plus size.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};

/// A point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Inclusive containment test; points on the border count as inside.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        point_in_rect(pt, *self)
    }

    /// Shrink by `pad` on every side. Size never goes below zero.
    #[must_use]
    pub fn inset(&self, pad: f64) -> Self {
        Self {
            x: self.x + pad,
            y: self.y + pad,
            w: (self.w - 2.0 * pad).max(0.0),
            h: (self.h - 2.0 * pad).max(0.0),
        }
    }

    /// Scale about the centre by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let c = self.center();
        let w = self.w * factor;
        let h = self.h * factor;
        Self { x: c.x - w / 2.0, y: c.y - h / 2.0, w, h }
    }
}

/// Inclusive point-in-rectangle test.
#[must_use]
pub fn point_in_rect(pt: Point, r: Rect) -> bool {
    pt.x >= r.x && pt.y >= r.y && pt.x <= r.x + r.w && pt.y <= r.y + r.h
}

/// Overlapping area of two rectangles; zero when they only touch or are apart.
#[must_use]
pub fn intersection_area(a: Rect, b: Rect) -> f64 {
    let ix = a.x.max(b.x);
    let iy = a.y.max(b.y);
    let iw = a.right().min(b.right()) - ix;
    let ih = a.bottom().min(b.bottom()) - iy;
    if iw <= 0.0 || ih <= 0.0 {
        return 0.0;
    }
    iw * ih
}

/// Euclidean distance from a point to the nearest point of a rectangle.
/// Zero for points inside or on the border.
#[must_use]
pub fn distance_to_rect(pt: Point, r: Rect) -> f64 {
    let dx = if pt.x < r.x {
        r.x - pt.x
    } else if pt.x > r.right() {
        pt.x - r.right()
    } else {
        0.0
    };
    let dy = if pt.y < r.y {
        r.y - pt.y
    } else if pt.y > r.bottom() {
        pt.y - r.bottom()
    } else {
        0.0
    };
    (dx * dx + dy * dy).sqrt()
}

/// Linear interpolation between `a` and `b` at fraction `t`.
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clamp `v` into `[min, max]`. When `max < min` the result is `max`; unlike
/// [`f64::clamp`] this never panics on an inverted range.
#[must_use]
pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    v.max(min).min(max)
}
