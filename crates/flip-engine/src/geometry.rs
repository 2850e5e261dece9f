//! Viewport geometry shared by the store, the driver and the hosts.

use serde::{Deserialize, Serialize};

/// Offsets smaller than this are treated as "did not move".
pub const MOVE_EPSILON: f64 = 0.01;

/// A bounding box in viewport coordinates, as reported by the layout query.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// The box an element would occupy if it sat flush against the right edge
    /// of `self` with the same size. Used as the "before" geometry of an
    /// element that was just inserted after this one.
    pub fn right_of(&self) -> Self {
        Self {
            top: self.top,
            left: self.left + self.width,
            width: self.width,
            height: self.height,
        }
    }

    /// Offset that moves `to` back onto `self`.
    pub fn offset_from(&self, to: &Rect) -> Offset {
        Offset {
            top: self.top - to.top,
            left: self.left - to.left,
        }
    }

    pub fn translated(&self, offset: Offset) -> Self {
        Self {
            top: self.top + offset.top,
            left: self.left + offset.left,
            ..*self
        }
    }
}

/// A relative-position offset in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub top: f64,
    pub left: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { top: 0.0, left: 0.0 };

    pub const fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }

    pub fn is_zero(&self) -> bool {
        self.top.abs() < MOVE_EPSILON && self.left.abs() < MOVE_EPSILON
    }
}

impl std::ops::Neg for Offset {
    type Output = Offset;

    fn neg(self) -> Offset {
        Offset {
            top: -self.top,
            left: -self.left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_of_copies_size_and_shifts_by_width() {
        let sibling = Rect::new(10.0, 0.0, 50.0, 20.0);
        assert_eq!(sibling.right_of(), Rect::new(10.0, 50.0, 50.0, 20.0));
    }

    #[test]
    fn offset_points_back_to_old_position() {
        let old = Rect::new(0.0, 100.0, 100.0, 20.0);
        let new = Rect::new(0.0, 200.0, 100.0, 20.0);
        let offset = old.offset_from(&new);
        assert_eq!(offset, Offset::new(0.0, -100.0));
        assert_eq!(new.translated(offset), old);
    }

    #[test]
    fn tiny_offsets_count_as_unmoved() {
        assert!(Offset::new(0.001, -0.004).is_zero());
        assert!(!Offset::new(0.0, 1.0).is_zero());
    }
}
