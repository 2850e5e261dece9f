//! Last-recorded geometry of every tracked element.

use std::collections::HashMap;

use crate::geometry::Rect;
use crate::keys::ElementKey;

/// Mapping from element key to the rectangle it occupied before the most
/// recent change.
///
/// While an element is mid-animation its entry deliberately lags live layout:
/// it keeps the old rectangle until the animation settles.
#[derive(Debug, Clone, Default)]
pub struct RectStore {
    rects: HashMap<ElementKey, Rect>,
}

impl RectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` means "no prior geometry", which callers treat as nothing to animate.
    pub fn get(&self, key: ElementKey) -> Option<Rect> {
        self.rects.get(&key).copied()
    }

    pub fn set(&mut self, key: ElementKey, rect: Rect) {
        self.rects.insert(key, rect);
    }

    pub fn has(&self, key: ElementKey) -> bool {
        self.rects.contains_key(&key)
    }

    pub fn remove(&mut self, key: ElementKey) -> Option<Rect> {
        self.rects.remove(&key)
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ElementKey> + '_ {
        self.rects.keys().copied()
    }
}
