//! In-memory host for unit tests. Layout is whatever the test says it is;
//! relative offsets apply instantly.

use std::collections::{HashMap, HashSet};

use crate::geometry::Rect;
use crate::host::{Layout, ObservationKind, Observers, Styles, TimerToken, Timers};
use crate::style::{InlineStyle, Position, StyleProperty};

pub struct MockHost {
    pub root: u32,
    pub children: Vec<u32>,
    pub natural: HashMap<u32, Rect>,
    pub positions: HashMap<u32, Position>,
    pub inline: HashMap<u32, HashMap<StyleProperty, InlineStyle>>,
    pub attributes: HashMap<(u32, String), String>,
    pub writes: Vec<(u32, InlineStyle)>,
    pub scheduled: Vec<(f64, TimerToken)>,
    pub observed: HashSet<(u32, ObservationKind)>,
}

impl MockHost {
    pub fn new(root: u32) -> Self {
        let mut natural = HashMap::new();
        natural.insert(root, Rect::new(0.0, 0.0, 1000.0, 1000.0));
        Self {
            root,
            children: Vec::new(),
            natural,
            positions: HashMap::new(),
            inline: HashMap::new(),
            attributes: HashMap::new(),
            writes: Vec::new(),
            scheduled: Vec::new(),
            observed: HashSet::new(),
        }
    }

    /// Set the natural rect of `node`, appending it if it is new.
    pub fn place(&mut self, node: u32, rect: Rect) {
        if node != self.root && !self.children.contains(&node) {
            self.children.push(node);
        }
        self.natural.insert(node, rect);
    }

    /// Set the natural rect of `node` and move it to the front.
    pub fn place_first(&mut self, node: u32, rect: Rect) {
        self.children.retain(|n| *n != node);
        self.children.insert(0, node);
        self.natural.insert(node, rect);
    }

    pub fn detach(&mut self, node: u32) {
        self.children.retain(|n| *n != node);
        self.natural.remove(&node);
    }

    pub fn inline(&self, node: u32, property: StyleProperty) -> Option<InlineStyle> {
        self.inline.get(&node).and_then(|styles| styles.get(&property)).copied()
    }

    pub fn has_overrides(&self, node: u32) -> bool {
        self.inline.get(&node).is_some_and(|styles| !styles.is_empty())
    }

    /// Pop the earliest scheduled timer.
    pub fn next_timer(&mut self) -> Option<(f64, TimerToken)> {
        if self.scheduled.is_empty() {
            return None;
        }
        let (index, _) = self
            .scheduled
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.0.total_cmp(&b.1.0))?;
        Some(self.scheduled.remove(index))
    }

    fn offset_px(&self, node: u32, property: StyleProperty) -> f64 {
        match self.inline(node, property) {
            Some(InlineStyle::Top(px)) | Some(InlineStyle::Left(px)) => px,
            _ => 0.0,
        }
    }
}

impl Layout for MockHost {
    type Node = u32;

    fn bounding_rect(&self, node: u32) -> Option<Rect> {
        let natural = *self.natural.get(&node)?;
        Some(Rect {
            top: natural.top + self.offset_px(node, StyleProperty::Top),
            left: natural.left + self.offset_px(node, StyleProperty::Left),
            ..natural
        })
    }

    fn computed_position(&self, node: u32) -> Position {
        match self.inline(node, StyleProperty::Position) {
            Some(InlineStyle::Position(position)) => position,
            _ => self.positions.get(&node).copied().unwrap_or_default(),
        }
    }

    fn tracked_elements(&self, root: u32) -> Vec<u32> {
        if root == self.root {
            self.children.clone()
        } else {
            Vec::new()
        }
    }

    fn attribute(&self, node: u32, name: &str) -> Option<String> {
        self.attributes.get(&(node, name.to_string())).cloned()
    }
}

impl Styles for MockHost {
    fn set_style(&mut self, node: u32, style: InlineStyle) {
        self.writes.push((node, style));
        self.inline
            .entry(node)
            .or_default()
            .insert(style.property(), style);
    }

    fn remove_style(&mut self, node: u32, property: StyleProperty) {
        if let Some(styles) = self.inline.get_mut(&node) {
            styles.remove(&property);
        }
    }

    fn set_attribute(&mut self, node: u32, name: &str, value: &str) {
        self.attributes
            .insert((node, name.to_string()), value.to_string());
    }

    fn remove_attribute(&mut self, node: u32, name: &str) {
        self.attributes.remove(&(node, name.to_string()));
    }
}

impl Observers for MockHost {
    fn observe(&mut self, node: u32, kind: ObservationKind) {
        self.observed.insert((node, kind));
    }

    fn unobserve(&mut self, node: u32, kind: ObservationKind) {
        self.observed.remove(&(node, kind));
    }

    fn disconnect(&mut self, kind: ObservationKind) {
        self.observed.retain(|(_, k)| *k != kind);
    }
}

impl Timers for MockHost {
    fn schedule(&mut self, delay_ms: f64, token: TimerToken) {
        self.scheduled.push((delay_ms, token));
    }
}
