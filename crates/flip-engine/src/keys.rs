//! Stable per-element keys.
//!
//! Keys come from a monotonic counter plus a free-list of keys released by
//! detached elements, so assignment is O(1) and never collides with a key
//! that is still attached.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::host::{Layout, NodeHandle, Styles};
use crate::store::RectStore;

/// Attribute the key is stamped under, so it can be read back off the element.
pub const KEY_ATTRIBUTE: &str = "data-flip-key";

/// Key of a tracked element. Unique among currently attached elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementKey(pub u32);

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct KeyAssigner<N: NodeHandle> {
    next: u32,
    free: Vec<ElementKey>,
    by_node: HashMap<N, ElementKey>,
}

impl<N: NodeHandle> Default for KeyAssigner<N> {
    fn default() -> Self {
        Self {
            next: 0,
            free: Vec::new(),
            by_node: HashMap::new(),
        }
    }
}

impl<N: NodeHandle> KeyAssigner<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_of(&self, node: N) -> Option<ElementKey> {
        self.by_node.get(&node).copied()
    }

    /// Key for `node`, assigning a fresh one on first sight.
    ///
    /// A fresh key is stamped onto the element and its current rectangle is
    /// captured into `store`. An element that already has a key keeps it and
    /// its store entry is left alone.
    pub fn assign<H>(&mut self, host: &mut H, store: &mut RectStore, node: N) -> ElementKey
    where
        H: Styles<Node = N>,
    {
        if let Some(key) = self.key_of(node) {
            return key;
        }

        let key = self.free.pop().unwrap_or_else(|| {
            let key = ElementKey(self.next);
            self.next += 1;
            key
        });
        self.by_node.insert(node, key);
        host.set_attribute(node, KEY_ATTRIBUTE, &key.to_string());
        capture(&*host, store, node, key);
        trace!(?node, %key, "assigned key");
        key
    }

    /// Forget `node` and return its key to the free-list.
    pub fn release(&mut self, node: N) -> Option<ElementKey> {
        let key = self.by_node.remove(&node)?;
        self.free.push(key);
        Some(key)
    }

    /// Release every node not in `live`, returning what was released.
    pub fn retain(&mut self, live: &HashSet<N>) -> Vec<(N, ElementKey)> {
        let stale: Vec<N> = self
            .by_node
            .keys()
            .filter(|node| !live.contains(node))
            .copied()
            .collect();
        stale
            .into_iter()
            .filter_map(|node| self.release(node).map(|key| (node, key)))
            .collect()
    }

    pub fn release_all(&mut self) -> Vec<(N, ElementKey)> {
        let all: Vec<N> = self.by_node.keys().copied().collect();
        all.into_iter()
            .filter_map(|node| self.release(node).map(|key| (node, key)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }
}

/// Record the live rectangle of `node` under `key`. Returns false (and
/// leaves the store untouched) when the host has no layout for the node.
pub fn capture<H>(host: &H, store: &mut RectStore, node: H::Node, key: ElementKey) -> bool
where
    H: Layout + ?Sized,
{
    match host.bounding_rect(node) {
        Some(rect) => {
            store.set(key, rect);
            true
        }
        None => {
            warn!(?node, %key, "no layout for tracked element");
            false
        }
    }
}
