//! The simulated page: element tree, layout, inline styles, observers.

use std::collections::{HashMap, HashSet};

use flip_engine::{
    Flight, FlipController, InlineStyle, Layout, MutationRecord, ObservationKind, Observers,
    Offset, OffsetTransition, Position, Rect, ResizeEntry, StyleProperty, Styles, TimerToken,
    Timers,
};
use serde::Serialize;
use taffy::{AvailableSpace, Dimension, TaffyTree};
use tracing::{debug, warn};

use crate::clock::VirtualClock;
use crate::transition::OffsetTrack;
use crate::{ElementId, Result, SimError};

/// One inline style change, as a DOM inspector would have recorded it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleWrite {
    pub at_ms: f64,
    pub element: ElementId,
    pub property: &'static str,
    /// `None` for a removal.
    pub value: Option<String>,
}

#[derive(Debug)]
struct Element {
    node: taffy::NodeId,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    /// Stylesheet `position`; an inline override wins.
    position: Position,
    inline: HashMap<StyleProperty, InlineStyle>,
    /// When the current inline `transition` took effect.
    transition_since: Option<f64>,
    top: OffsetTrack,
    left: OffsetTrack,
    attributes: HashMap<String, String>,
}

impl Element {
    fn new(node: taffy::NodeId) -> Self {
        Self {
            node,
            parent: None,
            children: Vec::new(),
            position: Position::Static,
            inline: HashMap::new(),
            transition_since: None,
            top: OffsetTrack::default(),
            left: OffsetTrack::default(),
            attributes: HashMap::new(),
        }
    }

    fn computed_position(&self) -> Position {
        match self.inline.get(&StyleProperty::Position) {
            Some(InlineStyle::Position(position)) => *position,
            _ => self.position,
        }
    }

    fn transition(&self) -> Option<(OffsetTransition, f64)> {
        match (self.inline.get(&StyleProperty::Transition), self.transition_since) {
            (Some(InlineStyle::Transition(transition)), Some(since)) => Some((*transition, since)),
            _ => None,
        }
    }

    fn rendered_offset(&self, now: f64) -> Offset {
        if self.computed_position() != Position::Relative {
            return Offset::ZERO;
        }
        Offset::new(self.top.value_at(now), self.left.value_at(now))
    }
}

/// Headless page implementing every [`flip_engine::Host`] seam.
///
/// Mutations do not reach the controller on their own: like the browser's
/// observers they are queued and delivered as batches by [`SimDocument::flush`].
pub struct SimDocument {
    tree: TaffyTree<()>,
    elements: HashMap<ElementId, Element>,
    root: ElementId,
    next_id: u32,
    viewport_width: f32,
    natural: HashMap<ElementId, Rect>,
    clock: VirtualClock,
    observed: HashSet<(ElementId, ObservationKind)>,
    observe_calls: usize,
    observed_sizes: HashMap<ElementId, (f64, f64)>,
    mutations: Vec<MutationRecord<ElementId>>,
    resizes: Vec<ResizeEntry<ElementId>>,
    writes: Vec<StyleWrite>,
}

impl SimDocument {
    /// Empty page whose root is a wrapping flex row as wide as the viewport.
    pub fn new(viewport_width: f32) -> Result<Self> {
        let mut tree = TaffyTree::new();
        let root_node = tree.new_leaf(taffy::Style {
            display: taffy::Display::Flex,
            flex_direction: taffy::FlexDirection::Row,
            flex_wrap: taffy::FlexWrap::Wrap,
            align_items: Some(taffy::AlignItems::FlexStart),
            align_content: Some(taffy::AlignContent::FlexStart),
            size: taffy::Size {
                width: Dimension::Percent(1.0),
                height: Dimension::Auto,
            },
            ..Default::default()
        })?;

        let root = ElementId(0);
        let mut elements = HashMap::new();
        elements.insert(root, Element::new(root_node));

        let mut doc = Self {
            tree,
            elements,
            root,
            next_id: 1,
            viewport_width,
            natural: HashMap::new(),
            clock: VirtualClock::new(),
            observed: HashSet::new(),
            observe_calls: 0,
            observed_sizes: HashMap::new(),
            mutations: Vec::new(),
            resizes: Vec::new(),
            writes: Vec::new(),
        };
        doc.relayout()?;
        Ok(doc)
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Detached fixed-size box.
    pub fn create_element(&mut self, width: f32, height: f32) -> Result<ElementId> {
        let node = self.tree.new_leaf(taffy::Style {
            size: taffy::Size {
                width: Dimension::Length(width),
                height: Dimension::Length(height),
            },
            flex_shrink: 0.0,
            ..Default::default()
        })?;
        Ok(self.register(node))
    }

    /// Detached auto-sized flex row that can hold children of its own.
    pub fn create_container(&mut self) -> Result<ElementId> {
        let node = self.tree.new_leaf(taffy::Style {
            display: taffy::Display::Flex,
            flex_direction: taffy::FlexDirection::Row,
            align_items: Some(taffy::AlignItems::FlexStart),
            flex_shrink: 0.0,
            ..Default::default()
        })?;
        Ok(self.register(node))
    }

    fn register(&mut self, node: taffy::NodeId) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, Element::new(node));
        id
    }

    /// Insert `child` into `parent` right after `after`, or first when `after`
    /// is `None`.
    pub fn insert_after(
        &mut self,
        parent: ElementId,
        child: ElementId,
        after: Option<ElementId>,
    ) -> Result<()> {
        if child == self.root {
            return Err(SimError::Root(child));
        }
        if self.element(child)?.parent.is_some() {
            return Err(SimError::AlreadyAttached(child));
        }
        let previous = self.link(parent, child, after)?;
        if self.observed.contains(&(parent, ObservationKind::Structure)) {
            self.mutations
                .push(MutationRecord::child_list(parent).with_added(child, previous));
        }
        debug!(%parent, %child, previous = ?previous, "inserted");
        self.relayout()
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        let last = self.element(parent)?.children.last().copied();
        self.insert_after(parent, child, last)
    }

    /// Detach `child` from its parent. The element can be inserted again.
    pub fn remove(&mut self, child: ElementId) -> Result<()> {
        let parent = self.unlink(child)?;
        if self.observed.contains(&(parent, ObservationKind::Structure)) {
            self.mutations
                .push(MutationRecord::child_list(parent).with_removed(child));
        }
        debug!(%parent, %child, "removed");
        self.relayout()
    }

    /// Move `child` within its parent, reported as one remove-and-add record.
    pub fn move_after(&mut self, child: ElementId, after: Option<ElementId>) -> Result<()> {
        let parent = self.unlink(child)?;
        let previous = self.link(parent, child, after)?;
        if self.observed.contains(&(parent, ObservationKind::Structure)) {
            self.mutations.push(
                MutationRecord::child_list(parent)
                    .with_removed(child)
                    .with_added(child, previous),
            );
        }
        debug!(%parent, %child, previous = ?previous, "moved");
        self.relayout()
    }

    pub fn set_size(&mut self, id: ElementId, width: f32, height: f32) -> Result<()> {
        let node = self.element(id)?.node;
        let mut style = self.tree.style(node)?.clone();
        style.size = taffy::Size {
            width: Dimension::Length(width),
            height: Dimension::Length(height),
        };
        self.tree.set_style(node, style)?;
        self.relayout()
    }

    /// Change the stylesheet `position` of an element.
    pub fn set_position(&mut self, id: ElementId, position: Position) -> Result<()> {
        let node = self.element(id)?.node;
        let mut style = self.tree.style(node)?.clone();
        style.position = match position {
            Position::Absolute | Position::Fixed => taffy::Position::Absolute,
            _ => taffy::Position::Relative,
        };
        self.tree.set_style(node, style)?;
        self.element_mut(id)?.position = position;
        self.relayout()
    }

    /// Resize the viewport and deliver the window resize to `controller`.
    pub fn resize_viewport(
        &mut self,
        controller: &mut FlipController<ElementId>,
        width: f32,
    ) -> Result<Vec<Flight<ElementId>>> {
        self.viewport_width = width;
        self.relayout()?;
        Ok(controller.on_viewport_resize(self))
    }

    /// Deliver queued structural records, then queued size entries.
    pub fn flush(&mut self, controller: &mut FlipController<ElementId>) -> Vec<Flight<ElementId>> {
        let mut started = Vec::new();
        let mutations = std::mem::take(&mut self.mutations);
        if !mutations.is_empty() {
            started.extend(controller.on_structural_change(self, &mutations));
        }
        let resizes = std::mem::take(&mut self.resizes);
        if !resizes.is_empty() {
            started.extend(controller.on_size_change(self, &resizes));
        }
        started
    }

    /// Fire every timer due up to `at` in order, then move the clock to `at`.
    /// Returns the number of timers fired.
    pub fn run_until(&mut self, controller: &mut FlipController<ElementId>, at: f64) -> usize {
        let mut fired = 0;
        while let Some((_, token)) = self.clock.pop_due(at) {
            controller.on_timer(self, token);
            fired += 1;
        }
        self.clock.advance_to(at);
        fired
    }

    pub fn advance(&mut self, controller: &mut FlipController<ElementId>, ms: f64) -> usize {
        let at = self.clock.now() + ms;
        self.run_until(controller, at)
    }

    /// Run until no timers are left.
    pub fn run_to_idle(&mut self, controller: &mut FlipController<ElementId>) -> usize {
        let mut fired = 0;
        while let Some(due) = self.clock.next_due() {
            fired += self.run_until(controller, due);
        }
        fired
    }

    /// Layout position without any relative offsets.
    pub fn natural_rect(&self, id: ElementId) -> Option<Rect> {
        self.natural.get(&id).copied()
    }

    /// Offset currently painted on the element itself, transitions included.
    pub fn rendered_offset(&self, id: ElementId) -> Option<Offset> {
        self.elements
            .get(&id)
            .map(|element| element.rendered_offset(self.clock.now()))
    }

    pub fn inline_style(&self, id: ElementId, property: StyleProperty) -> Option<InlineStyle> {
        self.elements
            .get(&id)
            .and_then(|element| element.inline.get(&property))
            .copied()
    }

    pub fn has_overrides(&self, id: ElementId) -> bool {
        self.elements
            .get(&id)
            .is_some_and(|element| !element.inline.is_empty())
    }

    pub fn is_animating(&self, id: ElementId) -> bool {
        let now = self.clock.now();
        self.elements
            .get(&id)
            .is_some_and(|element| element.top.is_animating(now) || element.left.is_animating(now))
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(&id)
            .map(|element| element.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn writes(&self) -> &[StyleWrite] {
        &self.writes
    }

    /// Active subscriptions across both notification kinds.
    pub fn subscriptions(&self) -> usize {
        self.observed.len()
    }

    /// Total `observe` calls received, duplicates included.
    pub fn observe_calls(&self) -> usize {
        self.observe_calls
    }

    pub fn is_observed(&self, id: ElementId, kind: ObservationKind) -> bool {
        self.observed.contains(&(id, kind))
    }

    pub fn pending_timers(&self) -> usize {
        self.clock.pending()
    }

    fn element(&self, id: ElementId) -> Result<&Element> {
        self.elements.get(&id).ok_or(SimError::UnknownElement(id))
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.elements.get_mut(&id).ok_or(SimError::UnknownElement(id))
    }

    /// Attach `child` under `parent` after `after`; returns its new previous sibling.
    fn link(
        &mut self,
        parent: ElementId,
        child: ElementId,
        after: Option<ElementId>,
    ) -> Result<Option<ElementId>> {
        let child_node = self.element(child)?.node;
        let parent_element = self.element(parent)?;
        let parent_node = parent_element.node;
        let index = match after {
            None => 0,
            Some(sibling) => {
                parent_element
                    .children
                    .iter()
                    .position(|c| *c == sibling)
                    .ok_or(SimError::NotAChild {
                        parent,
                        child: sibling,
                    })?
                    + 1
            }
        };

        self.tree.insert_child_at_index(parent_node, index, child_node)?;
        self.element_mut(parent)?.children.insert(index, child);
        self.element_mut(child)?.parent = Some(parent);
        Ok(after)
    }

    /// Detach `child` from its parent; returns the parent.
    fn unlink(&mut self, child: ElementId) -> Result<ElementId> {
        if child == self.root {
            return Err(SimError::Root(child));
        }
        let element = self.element(child)?;
        let child_node = element.node;
        let parent = element.parent.ok_or(SimError::UnknownElement(child))?;
        let parent_node = self.element(parent)?.node;

        self.tree.remove_child(parent_node, child_node)?;
        self.element_mut(parent)?.children.retain(|c| *c != child);
        self.element_mut(child)?.parent = None;
        Ok(parent)
    }

    /// Recompute layout and queue size entries for observed boxes that changed.
    fn relayout(&mut self) -> Result<()> {
        let root_node = self.element(self.root)?.node;
        self.tree.compute_layout(
            root_node,
            taffy::Size {
                width: AvailableSpace::Definite(self.viewport_width),
                height: AvailableSpace::MaxContent,
            },
        )?;

        let mut natural = HashMap::new();
        let mut stack = vec![(self.root, 0.0_f64, 0.0_f64)];
        while let Some((id, top, left)) = stack.pop() {
            let element = self.element(id)?;
            let layout = self.tree.layout(element.node)?;
            let rect = Rect::new(
                top + f64::from(layout.location.y),
                left + f64::from(layout.location.x),
                f64::from(layout.size.width),
                f64::from(layout.size.height),
            );
            natural.insert(id, rect);
            stack.extend(element.children.iter().map(|c| (*c, rect.top, rect.left)));
        }
        self.natural = natural;

        let mut resized: Vec<ElementId> = Vec::new();
        for &(id, kind) in &self.observed {
            if kind != ObservationKind::Size {
                continue;
            }
            let Some(rect) = self.natural.get(&id) else {
                continue;
            };
            let size = (rect.width, rect.height);
            if let Some(previous) = self.observed_sizes.insert(id, size) {
                if previous != size {
                    resized.push(id);
                }
            }
        }
        resized.sort();
        self.resizes
            .extend(resized.into_iter().map(|target| ResizeEntry { target }));
        Ok(())
    }

    fn record(&mut self, element: ElementId, property: StyleProperty, value: Option<String>) {
        self.writes.push(StyleWrite {
            at_ms: self.clock.now(),
            element,
            property: property.css_name(),
            value,
        });
    }
}

impl Layout for SimDocument {
    type Node = ElementId;

    fn bounding_rect(&self, node: ElementId) -> Option<Rect> {
        let natural = *self.natural.get(&node)?;
        let now = self.clock.now();
        let mut offset = Offset::ZERO;
        let mut cursor = Some(node);
        // Relative offsets on ancestors carry their descendants along.
        while let Some(id) = cursor {
            let element = self.elements.get(&id)?;
            let own = element.rendered_offset(now);
            offset = Offset::new(offset.top + own.top, offset.left + own.left);
            cursor = element.parent;
        }
        Some(natural.translated(offset))
    }

    fn computed_position(&self, node: ElementId) -> Position {
        self.elements
            .get(&node)
            .map(Element::computed_position)
            .unwrap_or_default()
    }

    fn tracked_elements(&self, root: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    fn attribute(&self, node: ElementId, name: &str) -> Option<String> {
        self.elements
            .get(&node)
            .and_then(|element| element.attributes.get(name))
            .cloned()
    }
}

impl Styles for SimDocument {
    fn set_style(&mut self, node: ElementId, style: InlineStyle) {
        let now = self.clock.now();
        let Some(element) = self.elements.get_mut(&node) else {
            warn!(%node, "style write on unknown element");
            return;
        };
        match style {
            InlineStyle::Top(px) => {
                let transition = element.transition();
                element.top.set(px, now, transition);
            }
            InlineStyle::Left(px) => {
                let transition = element.transition();
                element.left.set(px, now, transition);
            }
            InlineStyle::Transition(_) => {
                if element.inline.get(&StyleProperty::Transition) != Some(&style) {
                    element.transition_since = Some(now);
                }
            }
            InlineStyle::Position(_) => {}
        }
        element.inline.insert(style.property(), style);
        let (_, value) = style.to_css();
        self.record(node, style.property(), Some(value));
    }

    fn remove_style(&mut self, node: ElementId, property: StyleProperty) {
        let Some(element) = self.elements.get_mut(&node) else {
            warn!(%node, "style removal on unknown element");
            return;
        };
        if element.inline.remove(&property).is_none() {
            return;
        }
        match property {
            StyleProperty::Top => element.top.clear(),
            StyleProperty::Left => element.left.clear(),
            StyleProperty::Transition => element.transition_since = None,
            StyleProperty::Position => {}
        }
        self.record(node, property, None);
    }

    fn set_attribute(&mut self, node: ElementId, name: &str, value: &str) {
        if let Some(element) = self.elements.get_mut(&node) {
            element.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&mut self, node: ElementId, name: &str) {
        if let Some(element) = self.elements.get_mut(&node) {
            element.attributes.remove(name);
        }
    }
}

impl Observers for SimDocument {
    fn observe(&mut self, node: ElementId, kind: ObservationKind) {
        self.observe_calls += 1;
        self.observed.insert((node, kind));
        if kind == ObservationKind::Size {
            if let Some(rect) = self.natural.get(&node) {
                self.observed_sizes.insert(node, (rect.width, rect.height));
            }
        }
    }

    fn unobserve(&mut self, node: ElementId, kind: ObservationKind) {
        self.observed.remove(&(node, kind));
        if kind == ObservationKind::Size {
            self.observed_sizes.remove(&node);
        }
    }

    fn disconnect(&mut self, kind: ObservationKind) {
        self.observed.retain(|(_, k)| *k != kind);
        if kind == ObservationKind::Size {
            self.observed_sizes.clear();
            self.resizes.clear();
        } else {
            self.mutations.clear();
        }
    }
}

impl Timers for SimDocument {
    fn schedule(&mut self, delay_ms: f64, token: TimerToken) {
        self.clock.schedule(delay_ms, token);
    }
}
