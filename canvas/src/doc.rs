//! Document model: zones, blocks, technical links and their sparse updates.
//!
//! This module defines the entity shapes held by [`crate::store::Store`]
//! (`Zone`, `Block`, `TechLink`), the category enum that decides which blocks
//! may carry technical links, sparse-update types used both as creation
//! drafts and as edits (`ZonePatch`, `BlockPatch`), and a typed accessor for
//! the open-ended block property bag (`BlockProps`).
//!
//! Field names follow the snapshot wire format (`w`/`h`, `zoneId`,
//! `techLinks`), so these types serialize directly into a [`crate::snapshot::Snapshot`].

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::consts::ID_PREFIX;
use crate::geom::Rect;

/// Identifier of a zone or block, minted as `id_<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Mint the id for sequence number `n`.
    #[must_use]
    pub fn from_seq(n: u64) -> Self {
        Self(format!("{ID_PREFIX}{n}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric part of the first `id_<digits>` run in this id, or 0.
    ///
    /// Imported ids are not guaranteed to be minted by this crate, so the
    /// marker is searched anywhere in the string.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        for (at, _) in self.0.match_indices(ID_PREFIX) {
            let digits: String = self.0[at + ID_PREFIX.len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if digits.is_empty() {
                continue;
            }
            return digits.parse().unwrap_or(u64::MAX);
        }
        0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// What a block represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockCategory {
    /// Building envelope element (wall segment, opening).
    #[default]
    #[serde(alias = "enveloppe")]
    Envelope,
    /// Air handling equipment.
    Ventilation,
    /// Heat or cold production equipment.
    Production,
}

impl BlockCategory {
    /// Whether blocks of this category may carry a technical link.
    #[must_use]
    pub fn is_technical(self) -> bool {
        matches!(self, Self::Ventilation | Self::Production)
    }
}

/// A named rectangular area (room or functional area).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: EntityId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Zone {
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }

    /// Apply the present fields of `patch` in place.
    pub fn apply(&mut self, patch: &ZonePatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(w) = patch.w {
            self.w = w;
        }
        if let Some(h) = patch.h {
            self.h = h;
        }
    }
}

/// A placeable item with a category and free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: EntityId,
    pub name: String,
    #[serde(alias = "cat", default)]
    pub category: BlockCategory,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(alias = "props", default, deserialize_with = "null_as_default")]
    pub properties: Map<String, Value>,
    /// Zone this block currently belongs to. Non-owning.
    #[serde(rename = "zoneId", default)]
    pub zone_id: Option<EntityId>,
}

impl Block {
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Typed view over `properties`.
    #[must_use]
    pub fn props(&self) -> BlockProps<'_> {
        BlockProps::new(&self.properties)
    }

    /// Apply the present fields of `patch` in place.
    pub fn apply(&mut self, patch: &BlockPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(w) = patch.w {
            self.w = w;
        }
        if let Some(h) = patch.h {
            self.h = h;
        }
        if let Some(incoming) = &patch.properties {
            for (k, v) in incoming {
                if v.is_null() {
                    self.properties.remove(k);
                } else {
                    self.properties.insert(k.clone(), v.clone());
                }
            }
        }
    }
}

/// Directional association from a technical block to the zones it serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechLink {
    #[serde(rename = "blockId")]
    pub block_id: EntityId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub zones: Vec<EntityId>,
}

/// Reads an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Sparse zone fields. Used as a creation draft (merged over defaults) and
/// as an edit. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZonePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
}

impl ZonePatch {
    /// Patch holding a whole rectangle.
    #[must_use]
    pub fn rect(rect: Rect) -> Self {
        Self { x: Some(rect.x), y: Some(rect.y), w: Some(rect.w), h: Some(rect.h), ..Self::default() }
    }
}

/// Sparse block fields. Used as a creation draft and as an edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<BlockCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    /// Property keys to merge; `null` values delete the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl BlockPatch {
    /// Whether applying this patch can change the block's rectangle.
    #[must_use]
    pub fn touches_geometry(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.w.is_some() || self.h.is_some()
    }
}

/// Typed access to common keys of a block's property bag.
pub struct BlockProps<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> BlockProps<'a> {
    #[must_use]
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Rated power in kilowatts. Reads `power_kw`, falling back to the legacy
    /// `puissance` key.
    #[must_use]
    pub fn power_kw(&self) -> Option<f64> {
        self.map
            .get("power_kw")
            .or_else(|| self.map.get("puissance"))
            .and_then(Value::as_f64)
    }
}
