//! Hit-testing and zone lookup against the store's current entities.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::config::EditorConfig;
use crate::doc::{EntityId, Zone};
use crate::event::EntityRef;
use crate::geom::{Point, Rect, distance_to_rect, intersection_area, point_in_rect};
use crate::store::Store;

/// Which part of an entity was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    /// A zone's bottom-right resize handle.
    ResizeHandle,
    BlockBody,
    ZoneBody,
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: EntityId,
    pub part: HitPart,
}

impl Hit {
    /// The hit entity as a tagged reference.
    #[must_use]
    pub fn entity(&self) -> EntityRef {
        match self.part {
            HitPart::ResizeHandle | HitPart::ZoneBody => EntityRef::Zone(self.id.clone()),
            HitPart::BlockBody => EntityRef::Block(self.id.clone()),
        }
    }
}

/// The square resize handle of a zone with rectangle `zone`.
#[must_use]
pub fn handle_rect(zone: Rect, config: &EditorConfig) -> Rect {
    Rect::new(
        zone.right() - config.handle_inset,
        zone.bottom() - config.handle_inset,
        config.handle_size,
        config.handle_size,
    )
}

/// Layered hit test: zone handles, then blocks, then zone bodies, each layer
/// topmost first. The first hit wins.
#[must_use]
pub fn hit_test(pt: Point, store: &Store) -> Option<Hit> {
    let config = store.config();

    let handle = store
        .zones()
        .iter()
        .rev()
        .find(|z| point_in_rect(pt, handle_rect(z.rect(), config)));
    if let Some(zone) = handle {
        return Some(Hit { id: zone.id.clone(), part: HitPart::ResizeHandle });
    }

    if let Some(block) = store.blocks().iter().rev().find(|b| point_in_rect(pt, b.rect())) {
        return Some(Hit { id: block.id.clone(), part: HitPart::BlockBody });
    }

    store
        .zones()
        .iter()
        .rev()
        .find(|z| point_in_rect(pt, z.rect()))
        .map(|z| Hit { id: z.id.clone(), part: HitPart::ZoneBody })
}

/// The zone whose rectangle overlaps `rect` the most. Ties keep the zone
/// evaluated first; zones with no overlap never qualify.
#[must_use]
pub fn best_candidate_zone(rect: Rect, zones: &[Zone]) -> Option<&Zone> {
    let mut best: Option<(&Zone, f64)> = None;
    for zone in zones {
        let area = intersection_area(rect, zone.rect());
        if area <= 0.0 {
            continue;
        }
        if best.is_none_or(|(_, best_area)| area > best_area) {
            best = Some((zone, area));
        }
    }
    best.map(|(zone, _)| zone)
}

/// The zone closest to `pt`, if within `threshold`. A point inside a zone is
/// at distance 0. Ties keep the zone evaluated first.
#[must_use]
pub fn nearest_zone(pt: Point, zones: &[Zone], threshold: f64) -> Option<&Zone> {
    let mut best: Option<(&Zone, f64)> = None;
    for zone in zones {
        let d = distance_to_rect(pt, zone.rect());
        if d > threshold {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((zone, d));
        }
    }
    best.map(|(zone, _)| zone)
}
