//! Entity store: the single source of truth for zones, blocks and links.
//!
//! The store owns the canonical collections, the selection and the id
//! sequence. Every mutation is synchronous and total: an id that does not
//! exist turns the call into a silent no-op (the method returns `false` or
//! `None`). A mutation that does happen is completed in full before its
//! [`StoreEvent`] is published, so a faulty listener can never observe or
//! leave a half-applied change.
//!
//! Auto-fit runs from here: block geometry changes re-fit the owning zone,
//! rezoning re-fits both the old and (unless suppressed) the new zone, and
//! deleting a block re-fits every zone.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use crate::config::EditorConfig;
use crate::consts::{COPY_SUFFIX, DEFAULT_BLOCK_NAME, DEFAULT_BLOCK_RECT, DEFAULT_ZONE_NAME, DEFAULT_ZONE_RECT};
use crate::doc::{Block, BlockCategory, BlockPatch, EntityId, TechLink, Zone, ZonePatch};
use crate::event::{EntityRef, ListenerError, Observers, StoreEvent, SubscriptionId, UpdateMode};
use crate::fit::fitted_rect;
use crate::geom::Rect;
use crate::snapshot::Snapshot;

/// Observable store of editor entities.
pub struct Store {
    zones: Vec<Zone>,
    blocks: Vec<Block>,
    tech_links: Vec<TechLink>,
    selection: Option<EntityRef>,
    seq: u64,
    config: EditorConfig,
    observers: Observers<StoreEvent>,
}

impl Store {
    /// Create an empty store with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    #[must_use]
    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            zones: Vec::new(),
            blocks: Vec::new(),
            tech_links: Vec::new(),
            selection: None,
            seq: 0,
            config,
            observers: Observers::new(),
        }
    }

    // --- Subscriptions ---

    /// Register a listener invoked synchronously after every mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) -> Result<(), ListenerError> + 'static,
    {
        self.observers.subscribe(listener)
    }

    /// Revoke a subscription. Returns `true` if it was active.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    fn publish(&mut self, event: StoreEvent) {
        self.observers.notify(&event);
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Zones in insertion order (bottom of the paint order first).
    #[must_use]
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Blocks in insertion order (bottom of the paint order first).
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn tech_links(&self) -> &[TechLink] {
        &self.tech_links
    }

    #[must_use]
    pub fn zone(&self, id: &EntityId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == id)
    }

    #[must_use]
    pub fn block(&self, id: &EntityId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// The technical link owned by `block`, if any.
    #[must_use]
    pub fn link_for(&self, block: &EntityId) -> Option<&TechLink> {
        self.tech_links.iter().find(|l| &l.block_id == block)
    }

    /// Blocks currently assigned to `zone`.
    pub fn members_of<'a>(&'a self, zone: &'a EntityId) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks
            .iter()
            .filter(move |b| b.zone_id.as_ref() == Some(zone))
    }

    #[must_use]
    pub fn selection(&self) -> Option<&EntityRef> {
        self.selection.as_ref()
    }

    /// Resolve an id to a tagged reference by looking it up in both collections.
    #[must_use]
    pub fn resolve(&self, id: &EntityId) -> Option<EntityRef> {
        if self.zone(id).is_some() {
            Some(EntityRef::Zone(id.clone()))
        } else if self.block(id).is_some() {
            Some(EntityRef::Block(id.clone()))
        } else {
            None
        }
    }

    // --- Selection ---

    /// Select an entity by id, or clear the selection with `None`.
    /// Unknown ids are ignored. Returns `true` if the selection changed.
    pub fn select(&mut self, id: Option<&EntityId>) -> bool {
        let next = match id {
            Some(id) => match self.resolve(id) {
                Some(entity) => Some(entity),
                None => return false,
            },
            None => None,
        };
        if next == self.selection {
            return false;
        }
        self.selection.clone_from(&next);
        self.publish(StoreEvent::Selected { selection: next });
        true
    }

    fn clear_selection_of(&mut self, id: &EntityId) {
        if self.selection.as_ref().is_some_and(|s| s.id() == id) {
            self.selection = None;
        }
    }

    // --- Ids ---

    /// Next free `id_<n>`. The sequence wraps to 1 past `u64::MAX` and
    /// skips ids a restored snapshot already holds.
    fn mint_id(&mut self) -> EntityId {
        loop {
            self.seq = self.seq.checked_add(1).unwrap_or(1);
            let id = EntityId::from_seq(self.seq);
            if self.resolve(&id).is_none() {
                return id;
            }
        }
    }

    // --- Zones ---

    fn zone_index(&self, id: &EntityId) -> Option<usize> {
        self.zones.iter().position(|z| &z.id == id)
    }

    fn floor_zone_size(&self, w: f64, h: f64) -> (f64, f64) {
        (w.max(self.config.zone_min_w), h.max(self.config.zone_min_h))
    }

    /// Create a zone from `draft` merged over the defaults.
    pub fn add_zone(&mut self, draft: ZonePatch) -> EntityId {
        let (x, y, w, h) = DEFAULT_ZONE_RECT;
        let mut zone = Zone { id: self.mint_id(), name: DEFAULT_ZONE_NAME.to_owned(), x, y, w, h };
        zone.apply(&draft);
        (zone.w, zone.h) = self.floor_zone_size(zone.w, zone.h);

        let id = zone.id.clone();
        let rect = zone.rect();
        self.zones.push(zone);
        self.publish(StoreEvent::Added { entity: EntityRef::Zone(id.clone()), rect });
        id
    }

    /// Move a zone's top-left corner. Manual mode.
    pub fn move_zone(&mut self, id: &EntityId, x: f64, y: f64) -> bool {
        self.update_zone(id, &ZonePatch { x: Some(x), y: Some(y), ..ZonePatch::default() })
    }

    /// Resize a zone, never below the minimum size. Manual mode.
    pub fn resize_zone(&mut self, id: &EntityId, w: f64, h: f64) -> bool {
        self.update_zone(id, &ZonePatch { w: Some(w), h: Some(h), ..ZonePatch::default() })
    }

    /// Apply a sparse edit to a zone. Manual mode.
    pub fn update_zone(&mut self, id: &EntityId, patch: &ZonePatch) -> bool {
        let Some(idx) = self.zone_index(id) else {
            return false;
        };
        let (min_w, min_h) = (self.config.zone_min_w, self.config.zone_min_h);
        let zone = &mut self.zones[idx];
        zone.apply(patch);
        zone.w = zone.w.max(min_w);
        zone.h = zone.h.max(min_h);
        let rect = zone.rect();
        self.publish(StoreEvent::Updated { entity: EntityRef::Zone(id.clone()), rect, mode: UpdateMode::Manual });
        true
    }

    /// Replace a zone's rectangle verbatim with an explicit update mode.
    pub fn set_zone_rect(&mut self, id: &EntityId, rect: Rect, mode: UpdateMode) -> bool {
        let Some(idx) = self.zone_index(id) else {
            return false;
        };
        self.zones[idx].set_rect(rect);
        self.publish(StoreEvent::Updated { entity: EntityRef::Zone(id.clone()), rect, mode });
        true
    }

    /// Delete a zone. Links lose the zone (empty links are dropped), member
    /// blocks become unassigned, and a selection of it is cleared.
    pub fn delete_zone(&mut self, id: &EntityId) -> bool {
        let Some(idx) = self.zone_index(id) else {
            return false;
        };
        self.zones.remove(idx);

        for link in &mut self.tech_links {
            link.zones.retain(|z| z != id);
        }
        self.tech_links.retain(|l| !l.zones.is_empty());

        for block in &mut self.blocks {
            if block.zone_id.as_ref() == Some(id) {
                block.zone_id = None;
            }
        }
        self.clear_selection_of(id);
        self.publish(StoreEvent::Removed { entity: EntityRef::Zone(id.clone()) });
        true
    }

    /// Recompute a zone's rectangle from its members. No-op for unknown or
    /// empty zones; publishes an auto update only if the rectangle changed.
    pub fn fit_zone(&mut self, id: &EntityId) -> bool {
        let Some(idx) = self.zone_index(id) else {
            return false;
        };
        let Some(rect) = fitted_rect(self.members_of(id).map(Block::rect), &self.config) else {
            return false;
        };
        if self.zones[idx].rect() == rect {
            return false;
        }
        self.zones[idx].set_rect(rect);
        self.publish(StoreEvent::Updated { entity: EntityRef::Zone(id.clone()), rect, mode: UpdateMode::Auto });
        true
    }

    /// Re-fit every zone. Returns how many rectangles changed.
    pub fn fit_all_zones(&mut self) -> usize {
        let ids: Vec<EntityId> = self.zones.iter().map(|z| z.id.clone()).collect();
        ids.iter().filter(|id| self.fit_zone(id)).count()
    }

    // --- Blocks ---

    fn block_index(&self, id: &EntityId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == id)
    }

    /// Create an unassigned block from `draft` merged over the defaults.
    pub fn add_block(&mut self, draft: BlockPatch) -> EntityId {
        let (x, y, w, h) = DEFAULT_BLOCK_RECT;
        let mut block = Block {
            id: self.mint_id(),
            name: DEFAULT_BLOCK_NAME.to_owned(),
            category: BlockCategory::default(),
            x,
            y,
            w,
            h,
            properties: serde_json::Map::new(),
            zone_id: None,
        };
        block.apply(&draft);

        let id = block.id.clone();
        let rect = block.rect();
        self.blocks.push(block);
        self.publish(StoreEvent::Added { entity: EntityRef::Block(id.clone()), rect });
        id
    }

    /// Move a block's top-left corner. Manual mode; re-fits its zone.
    pub fn move_block(&mut self, id: &EntityId, x: f64, y: f64) -> bool {
        self.update_block(id, &BlockPatch { x: Some(x), y: Some(y), ..BlockPatch::default() })
    }

    /// Resize a block. Manual mode; re-fits its zone.
    pub fn resize_block(&mut self, id: &EntityId, w: f64, h: f64) -> bool {
        self.update_block(id, &BlockPatch { w: Some(w), h: Some(h), ..BlockPatch::default() })
    }

    /// Apply a sparse edit to a block. Manual mode. A geometry change re-fits
    /// the owning zone; turning the block non-technical drops its link.
    pub fn update_block(&mut self, id: &EntityId, patch: &BlockPatch) -> bool {
        let Some(idx) = self.block_index(id) else {
            return false;
        };
        let block = &mut self.blocks[idx];
        block.apply(patch);
        let rect = block.rect();
        let technical = block.category.is_technical();
        let owner = block.zone_id.clone();

        if !technical {
            self.tech_links.retain(|l| &l.block_id != id);
        }
        self.publish(StoreEvent::Updated { entity: EntityRef::Block(id.clone()), rect, mode: UpdateMode::Manual });

        if patch.touches_geometry()
            && let Some(zone) = owner
        {
            self.fit_zone(&zone);
        }
        true
    }

    /// Delete a block and its technical link, then re-fit every zone.
    pub fn delete_block(&mut self, id: &EntityId) -> bool {
        let Some(idx) = self.block_index(id) else {
            return false;
        };
        self.blocks.remove(idx);
        self.tech_links.retain(|l| &l.block_id != id);
        self.clear_selection_of(id);
        self.fit_all_zones();
        self.publish(StoreEvent::Removed { entity: EntityRef::Block(id.clone()) });
        true
    }

    /// Copy a block, offset and renamed, keeping its zone membership.
    pub fn duplicate_block(&mut self, id: &EntityId) -> Option<EntityId> {
        let source = self.block(id)?.clone();
        let offset = self.config.duplicate_offset;
        let copy = self.add_block(BlockPatch {
            name: Some(format!("{}{COPY_SUFFIX}", source.name)),
            category: Some(source.category),
            x: Some(source.x + offset),
            y: Some(source.y + offset),
            w: Some(source.w),
            h: Some(source.h),
            properties: Some(source.properties),
        });
        if let Some(zone) = &source.zone_id {
            self.assign_block_zone(&copy, Some(zone), true);
        }
        Some(copy)
    }

    /// Change a block's zone membership.
    ///
    /// No-op if the block is unknown, the target zone is unknown, or the
    /// membership is unchanged. Otherwise re-fits the previous zone and,
    /// when `fit_new` is set, the new one.
    pub fn assign_block_zone(&mut self, block: &EntityId, zone: Option<&EntityId>, fit_new: bool) -> bool {
        let Some(idx) = self.block_index(block) else {
            return false;
        };
        if let Some(zone) = zone
            && self.zone_index(zone).is_none()
        {
            return false;
        }
        if self.blocks[idx].zone_id.as_ref() == zone {
            return false;
        }

        let previous = std::mem::replace(&mut self.blocks[idx].zone_id, zone.cloned());
        if let Some(prev) = &previous {
            self.fit_zone(prev);
        }
        if fit_new && let Some(zone) = zone {
            self.fit_zone(zone);
        }
        self.publish(StoreEvent::Rezoned { block: block.clone(), zone: zone.cloned(), previous });
        true
    }

    // --- Technical links ---

    /// Replace the technical link of a ventilation or production block.
    ///
    /// Targets are filtered to existing zones and de-duplicated; an empty
    /// result removes the link. Unknown or envelope blocks are ignored.
    pub fn link_tech(&mut self, block: &EntityId, zones: &[EntityId]) -> bool {
        let Some(source) = self.block(block) else {
            return false;
        };
        if !source.category.is_technical() {
            return false;
        }

        let mut targets: Vec<EntityId> = Vec::new();
        for zone in zones {
            if self.zone_index(zone).is_some() && !targets.contains(zone) {
                targets.push(zone.clone());
            }
        }

        self.tech_links.retain(|l| &l.block_id != block);
        if !targets.is_empty() {
            self.tech_links.push(TechLink { block_id: block.clone(), zones: targets.clone() });
        }
        self.publish(StoreEvent::Linked { block: block.clone(), zones: targets });
        true
    }

    // --- Snapshot ---

    /// Deep copy of the three collections.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot { zones: self.zones.clone(), blocks: self.blocks.clone(), tech_links: self.tech_links.clone() }
    }

    /// Replace every collection from `snapshot`. Clears the selection and
    /// advances the id sequence past any restored id.
    pub fn replace(&mut self, snapshot: Snapshot) {
        let max_seq = snapshot.max_sequence();
        let Snapshot { zones, blocks, tech_links } = snapshot;

        self.zones = zones;
        self.blocks = blocks;
        self.tech_links = tech_links;
        self.seq = self.seq.max(max_seq);
        self.selection = None;
        tracing::debug!(
            zones = self.zones.len(),
            blocks = self.blocks.len(),
            links = self.tech_links.len(),
            seq = self.seq,
            "store replaced from snapshot"
        );
        self.publish(StoreEvent::Replaced);
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
