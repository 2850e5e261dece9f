//! Seams to the platform services the engine drives but does not implement.
//!
//! A browser binding implements these over the DOM, `MutationObserver`,
//! `ResizeObserver` and `setTimeout`; the headless host in `flip-sim`
//! implements them over a `taffy` layout tree and a virtual clock.
//!
//! ```text
//! Host
//!   ├── Layout     live geometry, computed position, tracked descendants
//!   ├── Styles     inline style and attribute writes
//!   ├── Observers  structural / size subscriptions
//!   └── Timers     single-shot callbacks carrying a TimerToken
//! ```

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::keys::ElementKey;
use crate::style::{InlineStyle, Position, StyleProperty};

/// Handle to a host element. Must stay valid (and equal to itself) for as
/// long as the element is attached.
pub trait NodeHandle: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> NodeHandle for T {}

/// Read-only view of live layout.
pub trait Layout {
    type Node: NodeHandle;

    /// `getBoundingClientRect` equivalent. `None` when the node is detached.
    fn bounding_rect(&self, node: Self::Node) -> Option<Rect>;

    /// Resolved `position` of the element.
    fn computed_position(&self, node: Self::Node) -> Position;

    /// Every element below `root`, in document order, excluding `root`.
    fn tracked_elements(&self, root: Self::Node) -> Vec<Self::Node>;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;
}

/// Inline style and attribute mutation.
pub trait Styles: Layout {
    fn set_style(&mut self, node: Self::Node, style: InlineStyle);

    fn remove_style(&mut self, node: Self::Node, property: StyleProperty);

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    fn remove_attribute(&mut self, node: Self::Node, name: &str);
}

/// The two notification services the container subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKind {
    /// Child-list changes only; no attributes, no subtree.
    Structure,
    /// Rendered box size changes.
    Size,
}

impl ObservationKind {
    pub const ALL: [ObservationKind; 2] = [ObservationKind::Structure, ObservationKind::Size];
}

/// Subscription management for both notification services.
pub trait Observers: Layout {
    fn observe(&mut self, node: Self::Node, kind: ObservationKind);

    fn unobserve(&mut self, node: Self::Node, kind: ObservationKind);

    /// Drop every subscription of `kind`.
    fn disconnect(&mut self, kind: ObservationKind);
}

/// Which phase transition a timer completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStage {
    /// Snapped → settling: zero the offsets.
    Release,
    /// Settling → idle: drop overrides and resync.
    Settle,
}

/// Opaque payload handed back to [`crate::FlipController::on_timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    pub key: ElementKey,
    pub generation: u64,
    pub stage: TimerStage,
}

/// Single-shot, non-cancellable timers.
pub trait Timers {
    fn schedule(&mut self, delay_ms: f64, token: TimerToken);
}

/// Everything the controller needs from its environment.
pub trait Host: Styles + Observers + Timers {}

impl<T: Styles + Observers + Timers> Host for T {}

/// One entry of a structural-change batch.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord<N> {
    /// Node whose child list changed.
    pub target: N,
    pub added: Vec<AddedNode<N>>,
    pub removed: Vec<N>,
}

impl<N> MutationRecord<N> {
    pub fn child_list(target: N) -> Self {
        Self {
            target,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn with_added(mut self, node: N, previous_sibling: Option<N>) -> Self {
        self.added.push(AddedNode {
            node,
            previous_sibling,
        });
        self
    }

    pub fn with_removed(mut self, node: N) -> Self {
        self.removed.push(node);
        self
    }
}

/// A node inserted by a mutation, with its previous sibling at insertion time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AddedNode<N> {
    pub node: N,
    pub previous_sibling: Option<N>,
}

/// One entry of a size-change batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEntry<N> {
    pub target: N,
}
