use flip_config::{DEFAULT_DURATION_MS, DEFAULT_SNAP_DELAY_MS, FlipConfig, ResyncPolicy};

use crate::easing::{Easing, EasingParseError};
use crate::style::OffsetTransition;

/// Initialization parameters of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipOptions {
    /// Length of the settle transition in milliseconds.
    pub duration_ms: f64,
    pub easing: Easing,
    /// Time the snapped state is held before the offsets are released.
    pub snap_delay_ms: f64,
    pub resync: ResyncPolicy,
}

impl Default for FlipOptions {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            easing: Easing::EaseInOut,
            snap_delay_ms: DEFAULT_SNAP_DELAY_MS,
            resync: ResyncPolicy::PerElement,
        }
    }
}

impl FlipOptions {
    pub fn from_config(config: &FlipConfig) -> Result<Self, EasingParseError> {
        let animation = &config.animation;
        Ok(Self {
            duration_ms: animation.duration_ms.max(0.0),
            easing: animation.easing.parse()?,
            snap_delay_ms: animation.snap_delay_ms.max(0.0),
            resync: animation.resync,
        })
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_snap_delay(mut self, snap_delay_ms: f64) -> Self {
        self.snap_delay_ms = snap_delay_ms;
        self
    }

    pub fn with_resync(mut self, resync: ResyncPolicy) -> Self {
        self.resync = resync;
        self
    }

    pub fn transition(&self) -> OffsetTransition {
        OffsetTransition {
            duration_ms: self.duration_ms,
            easing: self.easing,
        }
    }
}
