//! Snapshot wire format shared with persistence and import/export.
//!
//! A [`Snapshot`] is a deep copy of the store's three collections. Readers
//! are lenient: missing or `null` collections load as empty and unknown
//! fields are dropped. Only a payload that cannot be parsed at all fails.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::doc::{Block, EntityId, TechLink, Zone, null_as_default};

/// Error returned when reading or writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The payload is not a snapshot.
    #[error("failed to parse snapshot: {0}")]
    Parse(#[source] serde_json::Error),
    /// The snapshot could not be encoded.
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// The store's collections in wire shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub zones: Vec<Zone>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocks: Vec<Block>,
    #[serde(rename = "techLinks", default, deserialize_with = "null_as_default")]
    pub tech_links: Vec<TechLink>,
}

impl Snapshot {
    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Parse`] if the text is not a JSON object of
    /// the snapshot shape.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(raw).map_err(SnapshotError::Parse)
    }

    /// Encode as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Serialize`] if encoding fails.
    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(SnapshotError::Serialize)
    }

    /// Highest `id_<n>` sequence number among zones and blocks.
    #[must_use]
    pub fn max_sequence(&self) -> u64 {
        let zones = self.zones.iter().map(|z| z.id.sequence());
        let blocks = self.blocks.iter().map(|b| b.id.sequence());
        zones.chain(blocks).max().unwrap_or(0)
    }

    /// Referential problems a live store would never produce itself.
    #[must_use]
    pub fn issues(&self) -> Vec<Issue> {
        let mut out = Vec::new();

        let mut seen = HashSet::new();
        for id in self.zones.iter().map(|z| &z.id).chain(self.blocks.iter().map(|b| &b.id)) {
            if !seen.insert(id) {
                out.push(Issue::DuplicateId(id.clone()));
            }
        }

        let zone_ids: HashSet<&EntityId> = self.zones.iter().map(|z| &z.id).collect();
        for block in &self.blocks {
            if let Some(zone) = &block.zone_id
                && !zone_ids.contains(zone)
            {
                out.push(Issue::DanglingZone { block: block.id.clone(), zone: zone.clone() });
            }
        }

        let mut linked = HashSet::new();
        for link in &self.tech_links {
            if !linked.insert(&link.block_id) {
                out.push(Issue::DuplicateLink(link.block_id.clone()));
            }
            match self.blocks.iter().find(|b| b.id == link.block_id) {
                None => out.push(Issue::LinkMissingBlock(link.block_id.clone())),
                Some(block) if !block.category.is_technical() => {
                    out.push(Issue::LinkOnNonTechnical(link.block_id.clone()));
                }
                Some(_) => {}
            }
            if link.zones.is_empty() {
                out.push(Issue::EmptyLink(link.block_id.clone()));
            }
            for zone in &link.zones {
                if !zone_ids.contains(zone) {
                    out.push(Issue::LinkMissingZone { block: link.block_id.clone(), zone: zone.clone() });
                }
            }
        }
        out
    }
}

/// One referential problem found by [`Snapshot::issues`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    DuplicateId(EntityId),
    DanglingZone { block: EntityId, zone: EntityId },
    DuplicateLink(EntityId),
    LinkMissingBlock(EntityId),
    LinkOnNonTechnical(EntityId),
    LinkMissingZone { block: EntityId, zone: EntityId },
    EmptyLink(EntityId),
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate id {id}"),
            Self::DanglingZone { block, zone } => write!(f, "block {block} references missing zone {zone}"),
            Self::DuplicateLink(block) => write!(f, "block {block} has more than one technical link"),
            Self::LinkMissingBlock(block) => write!(f, "technical link references missing block {block}"),
            Self::LinkOnNonTechnical(block) => write!(f, "block {block} is not technical but has a link"),
            Self::LinkMissingZone { block, zone } => write!(f, "link of block {block} targets missing zone {zone}"),
            Self::EmptyLink(block) => write!(f, "technical link of block {block} has no zones"),
        }
    }
}
