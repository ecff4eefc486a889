//! Built-in catalog of block templates offered by the palette.

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;

use crate::doc::{BlockCategory, BlockPatch, EntityId};
use crate::geom::Point;
use crate::store::Store;

/// A spawnable block template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteItem {
    pub label: &'static str,
    pub category: BlockCategory,
    pub width: f64,
    pub height: f64,
}

pub const ITEMS: &[PaletteItem] = &[
    PaletteItem {
        label: "Wall",
        category: BlockCategory::Envelope,
        width: 160.0,
        height: 26.0,
    },
    PaletteItem {
        label: "Air handler",
        category: BlockCategory::Ventilation,
        width: 120.0,
        height: 80.0,
    },
    PaletteItem {
        label: "Boiler",
        category: BlockCategory::Production,
        width: 120.0,
        height: 80.0,
    },
];

/// Look up a template by label, ignoring ASCII case.
#[must_use]
pub fn find(label: &str) -> Option<&'static PaletteItem> {
    ITEMS.iter().find(|item| item.label.eq_ignore_ascii_case(label))
}

/// Add a block built from `item` with its top-left at `at`. The new block
/// belongs to no zone until it is dragged into one.
pub fn spawn(store: &mut Store, item: &PaletteItem, at: Point) -> EntityId {
    let id = store.add_block(BlockPatch {
        name: Some(item.label.to_owned()),
        category: Some(item.category),
        x: Some(at.x.max(0.0)),
        y: Some(at.y.max(0.0)),
        w: Some(item.width),
        h: Some(item.height),
        properties: None,
    });
    tracing::debug!(%id, label = item.label, "palette spawn");
    id
}
