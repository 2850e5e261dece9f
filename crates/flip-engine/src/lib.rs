//! flip-engine: layout-change animation for a tree of elements.
//!
//! The engine records the bounding rectangle of every tracked element. When
//! the tree changes it compares old and new geometry and plays a FLIP
//! transition: each moved element is snapped back to where it was with
//! relative offsets, then released so a CSS transition carries it to its new
//! place.
//!
//! Modules:
//! - `geometry`: rectangles and offsets
//! - `easing`: CSS timing functions
//! - `style`: the inline style overrides the engine writes
//! - `host`: traits the embedding tree implements (layout, styles, observers, timers)
//! - `store`, `keys`: recorded geometry and element keys
//! - `observe`: subscription bookkeeping
//! - `classify`: interpretation of structural-change batches
//! - `driver`: the per-element snap/release/settle state machine
//! - `controller`: [`FlipController`], the entry point tying them together

pub mod classify;
pub mod controller;
pub mod driver;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod host;
pub mod keys;
pub mod observe;
pub mod options;
pub mod store;
pub mod style;

#[cfg(test)]
mod testing;

pub use controller::FlipController;
pub use driver::{Flight, Phase, TimerOutcome};
pub use easing::Easing;
pub use error::SkipReason;
pub use flip_config::ResyncPolicy;
pub use geometry::{Offset, Rect};
pub use host::{
    AddedNode, Host, Layout, MutationRecord, NodeHandle, ObservationKind, Observers, ResizeEntry,
    Styles, TimerStage, TimerToken, Timers,
};
pub use keys::{ElementKey, KEY_ATTRIBUTE, KeyAssigner};
pub use options::FlipOptions;
pub use store::RectStore;
pub use style::{InlineStyle, OffsetTransition, Position, StyleProperty};
