#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use super::*;

fn recorder(store: &mut Store) -> Rc<RefCell<Vec<StoreEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    store.subscribe(move |event: &StoreEvent| {
        sink.borrow_mut().push(event.clone());
        Ok(())
    });
    log
}

fn zone_at(store: &mut Store, x: f64, y: f64, w: f64, h: f64) -> EntityId {
    store.add_zone(ZonePatch::rect(Rect::new(x, y, w, h)))
}

fn block_at(store: &mut Store, category: BlockCategory, x: f64, y: f64) -> EntityId {
    store.add_block(BlockPatch {
        category: Some(category),
        x: Some(x),
        y: Some(y),
        w: Some(120.0),
        h: Some(60.0),
        ..BlockPatch::default()
    })
}

fn zone_rect(store: &Store, id: &EntityId) -> Rect {
    store.zone(id).unwrap().rect()
}

// =============================================================
// Creation
// =============================================================

#[test]
fn add_zone_uses_defaults_and_publishes() {
    let mut store = Store::new();
    let log = recorder(&mut store);
    let id = store.add_zone(ZonePatch::default());

    assert_eq!(id, EntityId::new("id_1"));
    let zone = store.zone(&id).unwrap();
    assert_eq!(zone.name, "Zone");
    assert_eq!(zone.rect(), Rect::new(50.0, 50.0, 300.0, 200.0));
    assert_eq!(
        *log.borrow(),
        vec![StoreEvent::Added { entity: EntityRef::Zone(id), rect: Rect::new(50.0, 50.0, 300.0, 200.0) }]
    );
}

#[test]
fn add_zone_raises_size_to_minimum() {
    let mut store = Store::new();
    let id = zone_at(&mut store, 0.0, 0.0, 10.0, 10.0);
    assert_eq!(zone_rect(&store, &id), Rect::new(0.0, 0.0, 120.0, 80.0));
}

#[test]
fn add_block_uses_defaults_without_zone() {
    let mut store = Store::new();
    let id = store.add_block(BlockPatch::default());
    let block = store.block(&id).unwrap();
    assert_eq!(block.category, BlockCategory::Envelope);
    assert_eq!(block.rect(), Rect::new(80.0, 80.0, 120.0, 60.0));
    assert!(block.zone_id.is_none());
    assert!(block.properties.is_empty());
}

#[test]
fn ids_are_unique_across_kinds() {
    let mut store = Store::new();
    let z = store.add_zone(ZonePatch::default());
    let b = store.add_block(BlockPatch::default());
    let z2 = store.add_zone(ZonePatch::default());
    assert_eq!(z.as_str(), "id_1");
    assert_eq!(b.as_str(), "id_2");
    assert_eq!(z2.as_str(), "id_3");
}

// =============================================================
// Zone edits
// =============================================================

#[test]
fn move_zone_publishes_manual_update() {
    let mut store = Store::new();
    let id = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let log = recorder(&mut store);

    assert!(store.move_zone(&id, 40.0, 30.0));
    assert_eq!(
        *log.borrow(),
        vec![StoreEvent::Updated {
            entity: EntityRef::Zone(id),
            rect: Rect::new(40.0, 30.0, 300.0, 200.0),
            mode: UpdateMode::Manual,
        }]
    );
}

#[test]
fn resize_zone_never_goes_below_minimum() {
    let mut store = Store::new();
    let id = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    store.resize_zone(&id, 50.0, 20.0);
    assert_eq!(zone_rect(&store, &id), Rect::new(0.0, 0.0, 120.0, 80.0));
}

#[test]
fn update_zone_renames_and_keeps_geometry() {
    let mut store = Store::new();
    let id = zone_at(&mut store, 10.0, 20.0, 300.0, 200.0);
    store.update_zone(&id, &ZonePatch { name: Some("Kitchen".into()), ..ZonePatch::default() });
    let zone = store.zone(&id).unwrap();
    assert_eq!(zone.name, "Kitchen");
    assert_eq!(zone.rect(), Rect::new(10.0, 20.0, 300.0, 200.0));
}

#[test]
fn set_zone_rect_is_verbatim_with_given_mode() {
    let mut store = Store::new();
    let id = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let log = recorder(&mut store);

    let small = Rect::new(5.0, 5.0, 60.0, 40.0);
    assert!(store.set_zone_rect(&id, small, UpdateMode::Auto));
    assert_eq!(zone_rect(&store, &id), small);
    assert_eq!(
        *log.borrow(),
        vec![StoreEvent::Updated { entity: EntityRef::Zone(id), rect: small, mode: UpdateMode::Auto }]
    );
}

#[test]
fn unknown_ids_are_silent_no_ops() {
    let mut store = Store::new();
    let log = recorder(&mut store);
    let ghost = EntityId::new("id_99");

    assert!(!store.move_zone(&ghost, 1.0, 1.0));
    assert!(!store.resize_zone(&ghost, 200.0, 200.0));
    assert!(!store.set_zone_rect(&ghost, Rect::default(), UpdateMode::Auto));
    assert!(!store.delete_zone(&ghost));
    assert!(!store.move_block(&ghost, 1.0, 1.0));
    assert!(!store.delete_block(&ghost));
    assert!(store.duplicate_block(&ghost).is_none());
    assert!(!store.assign_block_zone(&ghost, None, true));
    assert!(!store.link_tech(&ghost, &[]));
    assert!(!store.fit_zone(&ghost));
    assert!(log.borrow().is_empty());
}

// =============================================================
// Block edits and auto-fit
// =============================================================

#[test]
fn update_block_merges_and_deletes_properties() {
    let mut store = Store::new();
    let id = block_at(&mut store, BlockCategory::Production, 0.0, 0.0);

    let first = json!({ "power_kw": 12.5, "note": "roof" });
    store.update_block(&id, &BlockPatch { properties: first.as_object().cloned(), ..BlockPatch::default() });
    let second = json!({ "note": null });
    store.update_block(&id, &BlockPatch { properties: second.as_object().cloned(), ..BlockPatch::default() });

    let block = store.block(&id).unwrap();
    assert_eq!(block.props().power_kw(), Some(12.5));
    assert!(!block.properties.contains_key("note"));
}

#[test]
fn move_block_refits_owning_zone_after_its_own_update() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = block_at(&mut store, BlockCategory::Envelope, 100.0, 100.0);
    store.assign_block_zone(&b, Some(&z), true);
    assert_eq!(zone_rect(&store, &z), Rect::new(76.0, 76.0, 168.0, 108.0));

    let log = recorder(&mut store);
    store.move_block(&b, 200.0, 150.0);
    assert_eq!(
        *log.borrow(),
        vec![
            StoreEvent::Updated {
                entity: EntityRef::Block(b),
                rect: Rect::new(200.0, 150.0, 120.0, 60.0),
                mode: UpdateMode::Manual,
            },
            StoreEvent::Updated {
                entity: EntityRef::Zone(z),
                rect: Rect::new(176.0, 126.0, 168.0, 108.0),
                mode: UpdateMode::Auto,
            },
        ]
    );
}

#[test]
fn renaming_a_block_does_not_refit() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = block_at(&mut store, BlockCategory::Envelope, 100.0, 100.0);
    store.assign_block_zone(&b, Some(&z), false);

    store.update_block(&b, &BlockPatch { name: Some("North wall".into()), ..BlockPatch::default() });
    assert_eq!(zone_rect(&store, &z), Rect::new(0.0, 0.0, 300.0, 200.0));
}

#[test]
fn fit_zone_is_idempotent() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = block_at(&mut store, BlockCategory::Envelope, 100.0, 100.0);
    store.assign_block_zone(&b, Some(&z), false);

    assert!(store.fit_zone(&z));
    let first = zone_rect(&store, &z);
    let log = recorder(&mut store);
    assert!(!store.fit_zone(&z));
    assert_eq!(zone_rect(&store, &z), first);
    assert!(log.borrow().is_empty());
}

#[test]
fn fit_zone_leaves_empty_zone_alone() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 10.0, 10.0, 400.0, 300.0);
    assert!(!store.fit_zone(&z));
    assert_eq!(zone_rect(&store, &z), Rect::new(10.0, 10.0, 400.0, 300.0));
}

#[test]
fn fitted_zone_respects_minimum_size() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = store.add_block(BlockPatch {
        x: Some(100.0),
        y: Some(100.0),
        w: Some(10.0),
        h: Some(10.0),
        ..BlockPatch::default()
    });
    store.assign_block_zone(&b, Some(&z), true);
    let rect = zone_rect(&store, &z);
    assert_eq!((rect.w, rect.h), (120.0, 80.0));
}

#[test]
fn fit_all_zones_counts_changed_rectangles() {
    let mut store = Store::new();
    let a = zone_at(&mut store, 50.0, 50.0, 300.0, 200.0);
    zone_at(&mut store, 500.0, 50.0, 300.0, 200.0);
    let b = block_at(&mut store, BlockCategory::Envelope, 100.0, 100.0);
    store.assign_block_zone(&b, Some(&a), false);

    assert_eq!(store.fit_all_zones(), 1);
    assert_eq!(zone_rect(&store, &a), Rect::new(76.0, 76.0, 168.0, 108.0));
    assert_eq!(store.fit_all_zones(), 0);
}

// =============================================================
// Membership
// =============================================================

#[test]
fn assign_refits_previous_zone_and_respects_fit_new() {
    let mut store = Store::new();
    let a = zone_at(&mut store, 0.0, 0.0, 600.0, 400.0);
    let b = zone_at(&mut store, 700.0, 0.0, 300.0, 200.0);
    let first = block_at(&mut store, BlockCategory::Envelope, 100.0, 100.0);
    let second = block_at(&mut store, BlockCategory::Envelope, 400.0, 300.0);
    store.assign_block_zone(&first, Some(&a), false);
    store.assign_block_zone(&second, Some(&a), true);
    assert_eq!(zone_rect(&store, &a), Rect::new(76.0, 76.0, 468.0, 308.0));

    let log = recorder(&mut store);
    assert!(store.assign_block_zone(&second, Some(&b), false));

    assert_eq!(zone_rect(&store, &a), Rect::new(76.0, 76.0, 168.0, 108.0));
    assert_eq!(zone_rect(&store, &b), Rect::new(700.0, 0.0, 300.0, 200.0));
    assert_eq!(
        log.borrow().last(),
        Some(&StoreEvent::Rezoned { block: second.clone(), zone: Some(b.clone()), previous: Some(a.clone()) })
    );
    assert_eq!(store.members_of(&b).map(|blk| blk.id.clone()).collect::<Vec<_>>(), vec![second]);
}

#[test]
fn assign_to_same_or_missing_zone_is_no_op() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = block_at(&mut store, BlockCategory::Envelope, 100.0, 100.0);
    store.assign_block_zone(&b, Some(&z), false);

    assert!(!store.assign_block_zone(&b, Some(&z), true));
    assert!(!store.assign_block_zone(&b, Some(&EntityId::new("id_42")), true));
    assert_eq!(store.block(&b).unwrap().zone_id.as_ref(), Some(&z));
}

#[test]
fn unassigning_clears_membership() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = block_at(&mut store, BlockCategory::Envelope, 100.0, 100.0);
    store.assign_block_zone(&b, Some(&z), false);

    assert!(store.assign_block_zone(&b, None, true));
    assert!(store.block(&b).unwrap().zone_id.is_none());
    assert_eq!(store.members_of(&z).count(), 0);
}

// =============================================================
// Deletion
// =============================================================

#[test]
fn delete_zone_cascades_to_blocks_and_links() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let other = zone_at(&mut store, 400.0, 0.0, 300.0, 200.0);
    let member = block_at(&mut store, BlockCategory::Envelope, 100.0, 100.0);
    let shared = block_at(&mut store, BlockCategory::Ventilation, 800.0, 0.0);
    let only = block_at(&mut store, BlockCategory::Production, 800.0, 200.0);
    store.assign_block_zone(&member, Some(&z), false);
    store.link_tech(&shared, &[z.clone(), other.clone()]);
    store.link_tech(&only, std::slice::from_ref(&z));
    store.select(Some(&z));

    let log = recorder(&mut store);
    assert!(store.delete_zone(&z));

    assert!(store.zone(&z).is_none());
    assert!(store.block(&member).unwrap().zone_id.is_none());
    assert_eq!(store.link_for(&shared).unwrap().zones, vec![other]);
    assert!(store.link_for(&only).is_none());
    assert!(store.selection().is_none());
    assert_eq!(*log.borrow(), vec![StoreEvent::Removed { entity: EntityRef::Zone(z) }]);
}

#[test]
fn delete_block_drops_link_and_refits_zones() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 600.0, 400.0);
    let keep = block_at(&mut store, BlockCategory::Envelope, 100.0, 100.0);
    let gone = block_at(&mut store, BlockCategory::Ventilation, 400.0, 300.0);
    store.assign_block_zone(&keep, Some(&z), false);
    store.assign_block_zone(&gone, Some(&z), true);
    store.link_tech(&gone, std::slice::from_ref(&z));
    store.select(Some(&gone));

    let log = recorder(&mut store);
    assert!(store.delete_block(&gone));

    assert!(store.block(&gone).is_none());
    assert!(store.link_for(&gone).is_none());
    assert!(store.selection().is_none());
    assert_eq!(zone_rect(&store, &z), Rect::new(76.0, 76.0, 168.0, 108.0));
    assert_eq!(log.borrow().last(), Some(&StoreEvent::Removed { entity: EntityRef::Block(gone) }));
}

// =============================================================
// Duplication
// =============================================================

#[test]
fn duplicate_copies_offsets_and_keeps_zone() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let src = store.add_block(BlockPatch {
        name: Some("Wall".into()),
        x: Some(100.0),
        y: Some(100.0),
        w: Some(160.0),
        h: Some(26.0),
        properties: json!({ "note": "brick" }).as_object().cloned(),
        ..BlockPatch::default()
    });
    store.assign_block_zone(&src, Some(&z), true);

    let copy = store.duplicate_block(&src).unwrap();
    assert_ne!(copy, src);
    let dup = store.block(&copy).unwrap();
    assert_eq!(dup.name, "Wall (copy)");
    assert_eq!(dup.rect(), Rect::new(124.0, 124.0, 160.0, 26.0));
    assert_eq!(dup.properties["note"], "brick");
    assert_eq!(dup.zone_id.as_ref(), Some(&z));
    let interior = zone_rect(&store, &z).inset(24.0);
    assert!(interior.x <= dup.x && interior.y <= dup.y);
    assert!(dup.rect().right() <= interior.right() && dup.rect().bottom() <= interior.bottom());
}

// =============================================================
// Technical links
// =============================================================

#[test]
fn link_tech_filters_and_dedups_targets() {
    let mut store = Store::new();
    let a = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = zone_at(&mut store, 400.0, 0.0, 300.0, 200.0);
    let ahu = block_at(&mut store, BlockCategory::Ventilation, 800.0, 0.0);

    let log = recorder(&mut store);
    assert!(store.link_tech(&ahu, &[a.clone(), EntityId::new("id_77"), a.clone(), b.clone()]));
    assert_eq!(store.link_for(&ahu).unwrap().zones, vec![a.clone(), b.clone()]);
    assert_eq!(*log.borrow(), vec![StoreEvent::Linked { block: ahu.clone(), zones: vec![a, b] }]);
}

#[test]
fn link_tech_replaces_then_removes() {
    let mut store = Store::new();
    let a = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = zone_at(&mut store, 400.0, 0.0, 300.0, 200.0);
    let boiler = block_at(&mut store, BlockCategory::Production, 800.0, 0.0);

    store.link_tech(&boiler, std::slice::from_ref(&a));
    store.link_tech(&boiler, std::slice::from_ref(&b));
    assert_eq!(store.tech_links().len(), 1);
    assert_eq!(store.link_for(&boiler).unwrap().zones, vec![b]);

    store.link_tech(&boiler, &[]);
    assert!(store.tech_links().is_empty());
}

#[test]
fn link_tech_ignores_envelope_blocks() {
    let mut store = Store::new();
    let a = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let wall = block_at(&mut store, BlockCategory::Envelope, 800.0, 0.0);
    assert!(!store.link_tech(&wall, &[a]));
    assert!(store.tech_links().is_empty());
}

#[test]
fn becoming_envelope_drops_link() {
    let mut store = Store::new();
    let a = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let ahu = block_at(&mut store, BlockCategory::Ventilation, 800.0, 0.0);
    store.link_tech(&ahu, &[a]);

    store.update_block(&ahu, &BlockPatch { category: Some(BlockCategory::Envelope), ..BlockPatch::default() });
    assert!(store.link_for(&ahu).is_none());
}

// =============================================================
// Selection
// =============================================================

#[test]
fn select_publishes_only_on_change() {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = block_at(&mut store, BlockCategory::Envelope, 0.0, 0.0);
    let log = recorder(&mut store);

    assert!(store.select(Some(&b)));
    assert!(!store.select(Some(&b)));
    assert!(!store.select(Some(&EntityId::new("id_50"))));
    assert!(store.select(Some(&z)));
    assert!(store.select(None));
    assert_eq!(
        *log.borrow(),
        vec![
            StoreEvent::Selected { selection: Some(EntityRef::Block(b)) },
            StoreEvent::Selected { selection: Some(EntityRef::Zone(z)) },
            StoreEvent::Selected { selection: None },
        ]
    );
}

// =============================================================
// Snapshot and replace
// =============================================================

fn populated() -> Store {
    let mut store = Store::new();
    let z = zone_at(&mut store, 0.0, 0.0, 300.0, 200.0);
    let b = block_at(&mut store, BlockCategory::Production, 100.0, 100.0);
    store.assign_block_zone(&b, Some(&z), true);
    store.link_tech(&b, &[z]);
    store
}

#[test]
fn snapshot_replace_round_trip() {
    let source = populated();
    let snap = source.snapshot();

    let mut target = Store::new();
    target.replace(snap.clone());
    assert_eq!(target.snapshot(), snap);
}

#[test]
fn replace_advances_id_sequence() {
    let mut store = Store::new();
    let snap = Snapshot::from_json(r#"{ "zones": [{ "id": "id_7", "name": "A", "x": 0, "y": 0, "w": 300, "h": 200 }] }"#)
        .unwrap();
    store.replace(snap);
    assert_eq!(store.add_zone(ZonePatch::default()).as_str(), "id_8");
}

#[test]
fn replace_never_rewinds_sequence() {
    let mut store = populated();
    store.replace(Snapshot::default());
    assert_eq!(store.add_block(BlockPatch::default()).as_str(), "id_3");
}

#[test]
fn minting_after_max_sequence_import_stays_unique() {
    let mut store = Store::new();
    let raw = json!({
        "zones": [
            { "id": "id_18446744073709551615", "name": "A", "x": 0, "y": 0, "w": 300, "h": 200 },
            { "id": "id_1", "name": "B", "x": 400, "y": 0, "w": 300, "h": 200 }
        ]
    })
    .to_string();
    store.replace(Snapshot::from_json(&raw).unwrap());

    let first = store.add_zone(ZonePatch::default());
    let second = store.add_zone(ZonePatch::default());
    assert_eq!(first.as_str(), "id_2");
    assert_eq!(second.as_str(), "id_3");
    assert_eq!(store.zones().len(), 4);
    assert!(store.snapshot().issues().is_empty());
}

#[test]
fn replace_clears_selection_and_publishes() {
    let mut store = populated();
    store.select(Some(&EntityId::new("id_1")));
    let log = recorder(&mut store);

    store.replace(Snapshot::default());
    assert!(store.selection().is_none());
    assert!(store.zones().is_empty());
    assert_eq!(*log.borrow(), vec![StoreEvent::Replaced]);
}

// =============================================================
// Listener isolation
// =============================================================

#[test]
fn faulty_listeners_do_not_block_mutation_or_others() {
    let mut store = Store::new();
    store.subscribe(|_: &StoreEvent| Err(ListenerError::Rejected("nope".into())));
    store.subscribe(|_: &StoreEvent| panic!("listener blew up"));
    let log = recorder(&mut store);

    let id = store.add_zone(ZonePatch::default());
    assert!(store.zone(&id).is_some());
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn unsubscribe_tracks_count() {
    let mut store = Store::new();
    let sub = store.subscribe(|_: &StoreEvent| Ok(()));
    assert_eq!(store.subscriber_count(), 1);
    assert!(store.unsubscribe(sub));
    assert!(!store.unsubscribe(sub));
    assert_eq!(store.subscriber_count(), 0);
}
