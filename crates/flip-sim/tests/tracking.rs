use std::collections::HashSet;

use anyhow::{Context, Result};
use flip_engine::{
    FlipController, FlipOptions, InlineStyle, KEY_ATTRIBUTE, Layout, ObservationKind, Offset,
    Position, Rect, StyleProperty,
};
use flip_sim::{ElementId, SimDocument};

fn row(doc: &mut SimDocument, count: usize, width: f32, height: f32) -> Result<Vec<ElementId>> {
    let root = doc.root();
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let id = doc.create_element(width, height)?;
        doc.append_child(root, id)?;
        ids.push(id);
    }
    Ok(ids)
}

fn attached(doc: &mut SimDocument) -> FlipController<ElementId> {
    let root = doc.root();
    let mut controller = FlipController::new(FlipOptions::default());
    controller.attach(doc, root);
    controller
}

/// Keys held by the root and every tracked element, checked against the
/// stamped attribute.
fn live_keys(doc: &SimDocument, controller: &FlipController<ElementId>) -> Result<Vec<u32>> {
    let mut keys = Vec::new();
    for node in std::iter::once(doc.root()).chain(controller.tracked().iter().copied()) {
        let key = controller.key_of(node).context("tracked element without key")?;
        assert_eq!(doc.attribute(node, KEY_ATTRIBUTE), Some(key.to_string()));
        keys.push(key.0);
    }
    Ok(keys)
}

#[test]
fn keys_stay_unique_across_insertions_and_removals() -> Result<()> {
    let mut doc = SimDocument::new(2000.0)?;
    let mut ids = row(&mut doc, 3, 40.0, 20.0)?;
    let mut controller = attached(&mut doc);

    for step in 0..12 {
        if step % 3 == 2 {
            let victim = ids.remove(step % ids.len());
            doc.remove(victim)?;
        } else {
            let id = doc.create_element(40.0, 20.0)?;
            let after = ids.get(step % (ids.len() + 1)).copied();
            doc.insert_after(doc.root(), id, after)?;
            ids = doc.children(doc.root()).to_vec();
        }
        doc.flush(&mut controller);
        if step % 2 == 0 {
            doc.run_to_idle(&mut controller);
        }

        let keys = live_keys(&doc, &controller)?;
        let unique: HashSet<u32> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len(), "duplicate key after step {step}");
    }
    Ok(())
}

#[test]
fn resync_leaves_exactly_the_live_elements() -> Result<()> {
    let mut doc = SimDocument::new(800.0)?;
    let ids = row(&mut doc, 4, 50.0, 20.0)?;
    let mut controller = attached(&mut doc);
    let gone = controller.key_of(ids[1]).context("keyed")?;

    doc.remove(ids[1])?;
    let extra = doc.create_element(50.0, 20.0)?;
    doc.append_child(doc.root(), extra)?;
    doc.flush(&mut controller);
    doc.run_to_idle(&mut controller);
    controller.resync(&mut doc);

    let expected: HashSet<u32> = live_keys(&doc, &controller)?.into_iter().collect();
    let stored: HashSet<u32> = controller.store().keys().map(|k| k.0).collect();
    assert_eq!(stored, expected);
    assert_eq!(stored.len(), 1 + 4);
    assert!(!controller.store().has(gone));
    assert_eq!(controller.key_of(ids[1]), None);

    for node in controller.tracked().to_vec() {
        let key = controller.key_of(node).context("keyed")?;
        assert_eq!(controller.store().get(key), doc.bounding_rect(node));
    }
    Ok(())
}

#[test]
fn removal_animates_the_followers() -> Result<()> {
    let mut doc = SimDocument::new(800.0)?;
    let ids = row(&mut doc, 3, 100.0, 20.0)?;
    let mut controller = attached(&mut doc);

    doc.remove(ids[0])?;
    let flights = doc.flush(&mut controller);

    let moved: Vec<(ElementId, Offset)> = flights.iter().map(|f| (f.node, f.offset)).collect();
    assert_eq!(
        moved,
        vec![(ids[1], Offset::new(0.0, 100.0)), (ids[2], Offset::new(0.0, 100.0))]
    );
    Ok(())
}

#[test]
fn removing_the_last_element_releases_its_key() -> Result<()> {
    let mut doc = SimDocument::new(800.0)?;
    let ids = row(&mut doc, 2, 100.0, 20.0)?;
    let mut controller = attached(&mut doc);
    let released = controller.key_of(ids[1]).context("keyed")?;

    doc.remove(ids[1])?;
    let flights = doc.flush(&mut controller);
    doc.run_to_idle(&mut controller);

    assert!(flights.is_empty());
    assert_eq!(controller.key_of(ids[1]), None);
    assert_eq!(doc.attribute(ids[1], KEY_ATTRIBUTE), None);
    assert!(!controller.store().has(released));
    assert_eq!(controller.store().len(), 2);
    assert!(!doc.is_observed(ids[1], ObservationKind::Size));
    Ok(())
}

#[test]
fn resync_twice_keeps_subscriptions_stable() -> Result<()> {
    let mut doc = SimDocument::new(800.0)?;
    row(&mut doc, 3, 50.0, 20.0)?;
    let mut controller = attached(&mut doc);
    let subscriptions = doc.subscriptions();
    let calls = doc.observe_calls();
    assert_eq!(subscriptions, 2 * 4);

    controller.resync(&mut doc);
    controller.resync(&mut doc);

    assert_eq!(doc.subscriptions(), subscriptions);
    assert_eq!(doc.observe_calls(), calls);
    assert_eq!(controller.observed(), 4);
    Ok(())
}

#[test]
fn net_insertion_is_estimated_right_of_its_sibling() -> Result<()> {
    // A 50px viewport: the spacer fills the first line, the sibling sits
    // below it at top 10 and the new element wraps onto a third line.
    let mut doc = SimDocument::new(50.0)?;
    let spacer = doc.create_element(50.0, 10.0)?;
    doc.append_child(doc.root(), spacer)?;
    let sibling = doc.create_element(50.0, 20.0)?;
    doc.append_child(doc.root(), sibling)?;
    let mut controller = attached(&mut doc);
    assert_eq!(doc.bounding_rect(sibling), Some(Rect::new(10.0, 0.0, 50.0, 20.0)));

    let inserted = doc.create_element(50.0, 20.0)?;
    doc.insert_after(doc.root(), inserted, Some(sibling))?;
    doc.flush(&mut controller);

    let key = controller.key_of(inserted).context("keyed")?;
    assert_eq!(
        controller.store().get(key),
        Some(Rect::new(10.0, 50.0, 50.0, 20.0))
    );
    assert_eq!(doc.natural_rect(inserted), Some(Rect::new(30.0, 0.0, 50.0, 20.0)));
    assert_eq!(doc.inline_style(inserted, StyleProperty::Top), Some(InlineStyle::Top(-20.0)));
    assert_eq!(doc.inline_style(inserted, StyleProperty::Left), Some(InlineStyle::Left(50.0)));
    Ok(())
}

#[test]
fn subtree_descendants_wait_for_resync() -> Result<()> {
    let mut doc = SimDocument::new(800.0)?;
    row(&mut doc, 1, 50.0, 20.0)?;
    let mut controller = attached(&mut doc);

    let group = doc.create_container()?;
    let inner = doc.create_element(10.0, 10.0)?;
    doc.append_child(group, inner)?;
    doc.append_child(doc.root(), group)?;
    doc.flush(&mut controller);

    // Only the inserted node itself is reported; its child has no baseline yet.
    assert!(controller.key_of(group).is_some());
    assert_eq!(controller.key_of(inner), None);
    assert!(doc.writes().iter().all(|w| w.element != inner));

    doc.run_to_idle(&mut controller);
    assert!(controller.key_of(inner).is_some());
    Ok(())
}

#[test]
fn size_change_moves_neighbours() -> Result<()> {
    let mut doc = SimDocument::new(800.0)?;
    let ids = row(&mut doc, 2, 100.0, 20.0)?;
    let mut controller = attached(&mut doc);

    doc.set_size(ids[0], 150.0, 20.0)?;
    let flights = doc.flush(&mut controller);

    let moved: Vec<ElementId> = flights.iter().map(|f| f.node).collect();
    assert_eq!(moved, vec![ids[1]]);
    let key = controller.key_of(ids[0]).context("keyed")?;
    assert_eq!(controller.store().get(key), Some(Rect::new(0.0, 0.0, 150.0, 20.0)));
    Ok(())
}

#[test]
fn viewport_resize_rewraps_and_animates() -> Result<()> {
    let mut doc = SimDocument::new(300.0)?;
    let ids = row(&mut doc, 3, 100.0, 20.0)?;
    let mut controller = attached(&mut doc);

    let flights = doc.resize_viewport(&mut controller, 200.0)?;

    assert_eq!(flights.len(), 1);
    assert_eq!(flights[0].node, ids[2]);
    assert_eq!(flights[0].offset, Offset::new(-20.0, 200.0));
    Ok(())
}

#[test]
fn out_of_flow_elements_are_never_offset() -> Result<()> {
    let mut doc = SimDocument::new(800.0)?;
    let ids = row(&mut doc, 2, 100.0, 20.0)?;
    doc.set_position(ids[1], Position::Absolute)?;
    let mut controller = attached(&mut doc);

    let first = doc.create_element(100.0, 20.0)?;
    doc.insert_after(doc.root(), first, None)?;
    doc.flush(&mut controller);

    assert!(controller.phase_of(ids[0]).is_some());
    assert_eq!(controller.phase_of(ids[1]), None);
    assert!(doc.writes().iter().all(|w| w.element != ids[1]));
    Ok(())
}

#[test]
fn detach_mid_flight_restores_the_page() -> Result<()> {
    let mut doc = SimDocument::new(800.0)?;
    let ids = row(&mut doc, 2, 100.0, 20.0)?;
    let mut controller = attached(&mut doc);
    doc.remove(ids[0])?;
    doc.flush(&mut controller);
    assert!(doc.has_overrides(ids[1]));

    controller.detach(&mut doc);

    assert!(!doc.has_overrides(ids[1]));
    assert_eq!(doc.subscriptions(), 0);
    assert_eq!(doc.attribute(ids[1], KEY_ATTRIBUTE), None);
    assert!(controller.store().is_empty());
    doc.run_to_idle(&mut controller);
    assert!(!doc.has_overrides(ids[1]));
    Ok(())
}
