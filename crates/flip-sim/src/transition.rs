//! Simulated CSS transitions on the `top` and `left` inline offsets.

use flip_engine::{Easing, OffsetTransition};

/// One running property transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Tween {
    pub fn value_at(&self, now: f64) -> f64 {
        if self.duration_ms <= 0.0 || now >= self.start_ms + self.duration_ms {
            return self.to;
        }
        let t = ((now - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * self.easing.evaluate(t)
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now >= self.start_ms + self.duration_ms
    }
}

/// Visual state of one offset property (`top` or `left`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OffsetTrack {
    value: f64,
    tween: Option<Tween>,
}

impl OffsetTrack {
    /// Rendered value at `now`.
    pub fn value_at(&self, now: f64) -> f64 {
        match &self.tween {
            Some(tween) => tween.value_at(now),
            None => self.value,
        }
    }

    /// Change the specified value. A transition that was already in effect
    /// before this instant animates from the rendered value; otherwise the
    /// value jumps.
    pub fn set(&mut self, value: f64, now: f64, transition: Option<(OffsetTransition, f64)>) {
        let current = self.value_at(now);
        self.tween = match transition {
            Some((transition, since)) if since < now && current != value => Some(Tween {
                from: current,
                to: value,
                start_ms: now,
                duration_ms: transition.duration_ms,
                easing: transition.easing,
            }),
            _ => None,
        };
        self.value = value;
    }

    /// Drop the inline value; the offset snaps to zero.
    pub fn clear(&mut self) {
        self.value = 0.0;
        self.tween = None;
    }

    pub fn is_animating(&self, now: f64) -> bool {
        self.tween.is_some_and(|tween| !tween.is_finished(now))
    }
}
