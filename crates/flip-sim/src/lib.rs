//! flip-sim: a headless host for the FLIP engine.
//!
//! `SimDocument` stands in for a browser page. Elements are laid out by
//! `taffy` as a wrapping flex row, timers run on a virtual clock and inline
//! `top`/`left` changes are rendered through simulated CSS transitions, so
//! the whole snap/release/settle cycle can be observed frame by frame
//! without a browser.
//!
//! ```ignore
//! let mut doc = SimDocument::new(800.0)?;
//! let a = doc.create_element(100.0, 20.0)?;
//! doc.append_child(doc.root(), a)?;
//!
//! let mut controller = FlipController::new(FlipOptions::default());
//! controller.attach(&mut doc, doc.root());
//!
//! let b = doc.create_element(100.0, 20.0)?;
//! doc.insert_after(doc.root(), b, None)?;
//! doc.flush(&mut controller);
//! doc.run_until(&mut controller, 300.0);
//! ```

use std::fmt;

use serde::Serialize;

pub mod clock;
pub mod document;
pub mod transition;

pub use clock::VirtualClock;
pub use document::{SimDocument, StyleWrite};

/// Handle to an element of a [`SimDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("layout failed: {0}")]
    Layout(#[from] taffy::TaffyError),
    #[error("no such element {0}")]
    UnknownElement(ElementId),
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: ElementId, child: ElementId },
    #[error("{0} is already in the tree")]
    AlreadyAttached(ElementId),
    #[error("{0} cannot be moved or removed")]
    Root(ElementId),
}

pub type Result<T> = std::result::Result<T, SimError>;
