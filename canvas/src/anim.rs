//! Animation layer: per-zone visual shadows of the authoritative rectangles.
//!
//! The [`Animator`] consumes [`StoreEvent`]s and keeps one [`VisualRecord`]
//! per zone. Creation and auto updates start a short linear tween; manual
//! updates snap so drags render with no latency. Records are ephemeral and
//! never written back into the store.

#[cfg(test)]
#[path = "anim_test.rs"]
mod anim_test;

use std::cell::Cell;
use std::collections::BTreeMap;

use crate::config::EditorConfig;
use crate::doc::{EntityId, Zone};
use crate::event::{EntityRef, StoreEvent, UpdateMode};
use crate::geom::{Rect, lerp};

/// Millisecond time source driving tweens.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock. `Date.now()` in the browser, a monotonic instant natively.
pub struct SystemClock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: std::time::Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[cfg(target_arch = "wasm32")]
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for tests and headless hosts.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start_ms: f64) -> Self {
        Self { now: Cell::new(start_ms) }
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// What the renderer draws for a zone: rectangle, opacity and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visual {
    pub rect: Rect,
    pub opacity: f64,
    pub scale: f64,
}

impl Visual {
    /// Fully visible at natural size.
    #[must_use]
    pub fn settled(rect: Rect) -> Self {
        Self { rect, opacity: 1.0, scale: 1.0 }
    }

    #[must_use]
    pub fn lerp(from: &Self, to: &Self, t: f64) -> Self {
        Self {
            rect: Rect::new(
                lerp(from.rect.x, to.rect.x, t),
                lerp(from.rect.y, to.rect.y, t),
                lerp(from.rect.w, to.rect.w, t),
                lerp(from.rect.h, to.rect.h, t),
            ),
            opacity: lerp(from.opacity, to.opacity, t),
            scale: lerp(from.scale, to.scale, t),
        }
    }
}

/// Interpolation state for one zone.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualRecord {
    pub current: Visual,
    pub target: Visual,
    pub from: Visual,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub animating: bool,
}

impl VisualRecord {
    #[must_use]
    pub fn settled(rect: Rect) -> Self {
        let v = Visual::settled(rect);
        Self { current: v, target: v, from: v, start_ms: 0.0, duration_ms: 0.0, animating: false }
    }

    /// Start a tween from `from` to `target`. A zero duration snaps.
    pub fn retarget(&mut self, from: Visual, target: Visual, now_ms: f64, duration_ms: f64) {
        self.from = from;
        self.target = target;
        self.start_ms = now_ms;
        self.duration_ms = duration_ms;
        if duration_ms > 0.0 {
            self.current = from;
            self.animating = true;
        } else {
            self.current = target;
            self.animating = false;
        }
    }

    /// Advance to `now_ms`. Returns `true` while still animating.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        if !self.animating {
            return false;
        }
        let t = if self.duration_ms > 0.0 {
            ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if t >= 1.0 {
            self.current = self.target;
            self.animating = false;
        } else {
            self.current = Visual::lerp(&self.from, &self.target, t);
        }
        self.animating
    }
}

/// Visual records keyed by zone id.
#[derive(Debug)]
pub struct Animator {
    records: BTreeMap<EntityId, VisualRecord>,
    tween_ms: f64,
    create_opacity: f64,
    create_scale: f64,
}

impl Animator {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            records: BTreeMap::new(),
            tween_ms: config.tween_ms,
            create_opacity: config.create_opacity,
            create_scale: config.create_scale,
        }
    }

    /// React to a store change. Block events are ignored.
    pub fn apply(&mut self, event: &StoreEvent, now_ms: f64) {
        match event {
            StoreEvent::Added { entity: EntityRef::Zone(id), rect } => {
                let from = Visual { rect: *rect, opacity: self.create_opacity, scale: self.create_scale };
                let mut record = VisualRecord::settled(*rect);
                record.retarget(from, Visual::settled(*rect), now_ms, self.tween_ms);
                self.records.insert(id.clone(), record);
            }
            StoreEvent::Updated { entity: EntityRef::Zone(id), rect, mode } => {
                let target = Visual::settled(*rect);
                match (self.records.get_mut(id), mode) {
                    (Some(record), UpdateMode::Auto) => {
                        let from = record.current;
                        record.retarget(from, target, now_ms, self.tween_ms);
                    }
                    (Some(record), UpdateMode::Manual) => record.retarget(target, target, now_ms, 0.0),
                    (None, _) => {
                        self.records.insert(id.clone(), VisualRecord::settled(*rect));
                    }
                }
            }
            StoreEvent::Removed { entity: EntityRef::Zone(id) } => {
                self.records.remove(id);
            }
            StoreEvent::Replaced => self.records.clear(),
            _ => {}
        }
    }

    /// Create settled records for zones not yet tracked.
    pub fn sync(&mut self, zones: &[Zone]) {
        for zone in zones {
            self.records
                .entry(zone.id.clone())
                .or_insert_with(|| VisualRecord::settled(zone.rect()));
        }
    }

    /// Advance every record. Returns `true` if any record is still animating.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let mut any = false;
        for record in self.records.values_mut() {
            any |= record.advance(now_ms);
        }
        any
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.records.values().any(|r| r.animating)
    }

    #[must_use]
    pub fn record(&self, id: &EntityId) -> Option<&VisualRecord> {
        self.records.get(id)
    }

    /// Current visual of `zone`, or its settled rectangle when untracked.
    #[must_use]
    pub fn visual_of(&self, zone: &Zone) -> Visual {
        self.records
            .get(&zone.id)
            .map_or_else(|| Visual::settled(zone.rect()), |r| r.current)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
