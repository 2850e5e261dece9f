//! Two-phase FLIP playback for a single element.
//!
//! ```text
//! IDLE ──animate──▶ SNAPPED ──snap_delay──▶ SETTLING ──duration──▶ IDLE
//!          offsets = old − new      offsets = 0        overrides removed,
//!          transition attached      (browser animates)  store resynced
//! ```
//!
//! Every trigger takes a fresh generation number and the timers it schedules
//! carry it. A timer whose generation no longer matches the element's current
//! flight belongs to a superseded animation and is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::SkipReason;
use crate::geometry::{Offset, Rect};
use crate::host::{NodeHandle, Styles, TimerStage, TimerToken, Timers};
use crate::keys::{ElementKey, KeyAssigner};
use crate::options::FlipOptions;
use crate::store::RectStore;
use crate::style::{InlineStyle, Position, StyleProperty};

/// Non-idle animation phase. Idle elements have no flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Offsets hold the element at its old position.
    Snapped,
    /// Offsets are zero and the transition is carrying the element home.
    Settling,
}

/// An in-progress animation of one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flight<N> {
    pub node: N,
    pub key: ElementKey,
    pub generation: u64,
    pub phase: Phase,
    /// Natural (offset-free) rectangle the element is animating towards.
    pub target: Rect,
    /// Inline offset currently written on the element.
    pub offset: Offset,
}

/// What a delivered timer did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerOutcome<N> {
    Released { node: N, key: ElementKey },
    /// The element is idle again; its store entry needs a resync.
    Settled { node: N, key: ElementKey },
}

#[derive(Debug, Clone)]
pub struct AnimationDriver<N: NodeHandle> {
    options: FlipOptions,
    flights: HashMap<ElementKey, Flight<N>>,
    next_generation: u64,
}

impl<N: NodeHandle> AnimationDriver<N> {
    pub fn new(options: FlipOptions) -> Self {
        Self {
            options,
            flights: HashMap::new(),
            next_generation: 1,
        }
    }

    pub fn options(&self) -> &FlipOptions {
        &self.options
    }

    /// Snap `node` back to its recorded position and schedule the release.
    ///
    /// `entering` marks elements inserted by the current batch: they run the
    /// full cycle even when their synthesized baseline equals live layout.
    pub fn animate<H>(
        &mut self,
        host: &mut H,
        keys: &KeyAssigner<N>,
        store: &mut RectStore,
        node: N,
        entering: bool,
    ) -> Result<Flight<N>, SkipReason>
    where
        H: Styles<Node = N> + Timers,
    {
        let key = keys.key_of(node).ok_or(SkipReason::Untracked)?;
        let live = host.bounding_rect(node).ok_or(SkipReason::Detached(key))?;

        let (old, new) = match self.flights.get(&key).copied() {
            None => {
                let old = store.get(key).ok_or(SkipReason::MissingGeometry(key))?;
                (old, live)
            }
            Some(flight) => {
                if flight.phase == Phase::Settling {
                    // Already heading home; the settle resync picks up any
                    // layout change made in the meantime.
                    return Err(SkipReason::Settling(key));
                }
                // Restart from where the element was last painted: its
                // previous target carrying the snapped offset.
                let natural = live.translated(-flight.offset);
                if natural.offset_from(&flight.target).is_zero() {
                    return Err(SkipReason::AlreadySnapped(key));
                }
                (flight.target.translated(flight.offset), natural)
            }
        };

        let offset = old.offset_from(&new);
        if offset.is_zero() && !entering && !self.flights.contains_key(&key) {
            store.set(key, new);
            return Err(SkipReason::Unmoved(key));
        }

        let position = host.computed_position(node);
        if !position.supports_offset_animation() {
            return Err(SkipReason::UnsupportedPosition { key, position });
        }

        store.set(key, old);
        Ok(self.snap(host, node, key, new, offset))
    }

    fn snap<H>(
        &mut self,
        host: &mut H,
        node: N,
        key: ElementKey,
        target: Rect,
        offset: Offset,
    ) -> Flight<N>
    where
        H: Styles<Node = N> + Timers,
    {
        let generation = self.next_generation;
        self.next_generation += 1;

        if self.flights.contains_key(&key) {
            host.remove_style(node, StyleProperty::Transition);
        }
        host.set_style(node, InlineStyle::Position(Position::Relative));
        host.set_style(node, InlineStyle::Top(offset.top));
        host.set_style(node, InlineStyle::Left(offset.left));
        host.set_style(node, InlineStyle::Transition(self.options.transition()));

        let flight = Flight {
            node,
            key,
            generation,
            phase: Phase::Snapped,
            target,
            offset,
        };
        self.flights.insert(key, flight);
        host.schedule(
            self.options.snap_delay_ms,
            TimerToken {
                key,
                generation,
                stage: TimerStage::Release,
            },
        );
        trace!(?node, %key, generation, top = offset.top, left = offset.left, "snapped");
        flight
    }

    /// Advance the flight a timer belongs to. Stale tokens return `None`.
    pub fn on_timer<H>(&mut self, host: &mut H, token: TimerToken) -> Option<TimerOutcome<N>>
    where
        H: Styles<Node = N> + Timers,
    {
        let Some(flight) = self.flights.get_mut(&token.key) else {
            trace!(key = %token.key, generation = token.generation, "timer for idle element");
            return None;
        };
        if flight.generation != token.generation {
            trace!(
                key = %token.key,
                generation = token.generation,
                current = flight.generation,
                "stale timer"
            );
            return None;
        }

        let node = flight.node;
        let key = flight.key;
        match (token.stage, flight.phase) {
            (TimerStage::Release, Phase::Snapped) => {
                flight.phase = Phase::Settling;
                flight.offset = Offset::ZERO;
                host.set_style(node, InlineStyle::Top(0.0));
                host.set_style(node, InlineStyle::Left(0.0));
                host.schedule(
                    self.options.duration_ms,
                    TimerToken {
                        stage: TimerStage::Settle,
                        ..token
                    },
                );
                trace!(?node, %key, "released");
                Some(TimerOutcome::Released { node, key })
            }
            (TimerStage::Settle, Phase::Settling) => {
                self.flights.remove(&key);
                release_overrides(host, node);
                trace!(?node, %key, "settled");
                Some(TimerOutcome::Settled { node, key })
            }
            _ => None,
        }
    }

    pub fn phase_of(&self, key: ElementKey) -> Option<Phase> {
        self.flights.get(&key).map(|flight| flight.phase)
    }

    pub fn is_in_flight(&self, key: ElementKey) -> bool {
        self.flights.contains_key(&key)
    }

    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }

    /// Drop the flight of an element that left the tree and clear its
    /// overrides. Its timers go stale.
    pub fn forget<H>(&mut self, host: &mut H, key: ElementKey) -> Option<Flight<N>>
    where
        H: Styles<Node = N>,
    {
        let flight = self.flights.remove(&key)?;
        release_overrides(host, flight.node);
        Some(flight)
    }

    /// Abandon every flight, restoring natural layout on elements still present.
    pub fn cancel_all<H>(&mut self, host: &mut H)
    where
        H: Styles<Node = N>,
    {
        for (_, flight) in self.flights.drain() {
            if host.bounding_rect(flight.node).is_some() {
                release_overrides(host, flight.node);
            }
        }
    }
}

fn release_overrides<H>(host: &mut H, node: H::Node)
where
    H: Styles + ?Sized,
{
    for property in StyleProperty::OVERRIDES {
        host.remove_style(node, property);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::host::Layout;
    use crate::testing::MockHost;

    fn tracked(host: &mut MockHost, nodes: &[(u32, Rect)]) -> (KeyAssigner<u32>, RectStore) {
        let mut keys = KeyAssigner::new();
        let mut store = RectStore::new();
        for &(node, rect) in nodes {
            host.place(node, rect);
            keys.assign(host, &mut store, node);
        }
        (keys, store)
    }

    #[test]
    fn snaps_to_old_position_and_schedules_release() {
        let mut host = MockHost::new(0);
        let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 100.0, 100.0, 20.0))]);
        host.place(1, Rect::new(0.0, 200.0, 100.0, 20.0));
        let mut driver = AnimationDriver::new(FlipOptions::default());

        let flight = driver.animate(&mut host, &keys, &mut store, 1, false).unwrap();

        assert_eq!(flight.phase, Phase::Snapped);
        assert_eq!(flight.offset, Offset::new(0.0, -100.0));
        assert_eq!(host.inline(1, StyleProperty::Left), Some(InlineStyle::Left(-100.0)));
        assert_eq!(
            host.inline(1, StyleProperty::Position),
            Some(InlineStyle::Position(Position::Relative))
        );
        // Visually still where it was.
        assert_eq!(host.bounding_rect(1), Some(Rect::new(0.0, 100.0, 100.0, 20.0)));
        assert_eq!(host.scheduled.len(), 1);
        assert_eq!(host.scheduled[0].0, 10.0);
        assert_eq!(host.scheduled[0].1.stage, TimerStage::Release);
    }

    #[test]
    fn missing_geometry_is_a_silent_skip() {
        let mut host = MockHost::new(0);
        let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        store.clear();
        let mut driver = AnimationDriver::new(FlipOptions::default());

        let key = keys.key_of(1).unwrap();
        assert_eq!(
            driver.animate(&mut host, &keys, &mut store, 1, false),
            Err(SkipReason::MissingGeometry(key))
        );
        assert!(host.writes.is_empty());
        assert!(host.scheduled.is_empty());
    }

    #[test]
    fn untracked_elements_are_skipped() {
        let mut host = MockHost::new(0);
        let keys = KeyAssigner::new();
        let mut store = RectStore::new();
        let mut driver = AnimationDriver::new(FlipOptions::default());

        assert_eq!(
            driver.animate(&mut host, &keys, &mut store, 5, false),
            Err(SkipReason::Untracked)
        );
    }

    #[test]
    fn out_of_flow_positions_are_skipped() {
        for position in [Position::Absolute, Position::Fixed] {
            let mut host = MockHost::new(0);
            let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
            host.place(1, Rect::new(0.0, 50.0, 10.0, 10.0));
            host.positions.insert(1, position);
            let mut driver = AnimationDriver::new(FlipOptions::default());

            let result = driver.animate(&mut host, &keys, &mut store, 1, false);

            assert!(matches!(result, Err(SkipReason::UnsupportedPosition { .. })));
            assert!(host.writes.is_empty());
        }
    }

    #[test]
    fn unmoved_element_refreshes_its_entry() {
        let mut host = MockHost::new(0);
        let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        host.place(1, Rect::new(0.0, 0.0, 40.0, 10.0));
        let mut driver = AnimationDriver::new(FlipOptions::default());

        let key = keys.key_of(1).unwrap();
        assert_eq!(
            driver.animate(&mut host, &keys, &mut store, 1, false),
            Err(SkipReason::Unmoved(key))
        );
        assert_eq!(store.get(key), Some(Rect::new(0.0, 0.0, 40.0, 10.0)));
        assert!(host.writes.is_empty());
    }

    #[test]
    fn entering_element_runs_even_without_offset() {
        let mut host = MockHost::new(0);
        let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        let mut driver = AnimationDriver::new(FlipOptions::default());

        let flight = driver.animate(&mut host, &keys, &mut store, 1, true).unwrap();
        assert!(flight.offset.is_zero());
        assert_eq!(driver.phase_of(flight.key), Some(Phase::Snapped));
    }

    #[test]
    fn full_cycle_releases_then_settles() {
        let mut host = MockHost::new(0);
        let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 100.0, 100.0, 20.0))]);
        host.place(1, Rect::new(0.0, 200.0, 100.0, 20.0));
        let mut driver = AnimationDriver::new(FlipOptions::default().with_duration(300.0));
        let flight = driver.animate(&mut host, &keys, &mut store, 1, false).unwrap();

        let (_, release) = host.next_timer().unwrap();
        assert_eq!(
            driver.on_timer(&mut host, release),
            Some(TimerOutcome::Released { node: 1, key: flight.key })
        );
        assert_eq!(host.inline(1, StyleProperty::Top), Some(InlineStyle::Top(0.0)));
        assert_eq!(host.inline(1, StyleProperty::Left), Some(InlineStyle::Left(0.0)));
        // The baseline still holds the old rect while settling.
        assert_eq!(store.get(flight.key), Some(Rect::new(0.0, 100.0, 100.0, 20.0)));

        let (delay, settle) = host.next_timer().unwrap();
        assert_eq!(delay, 300.0);
        assert_eq!(
            driver.on_timer(&mut host, settle),
            Some(TimerOutcome::Settled { node: 1, key: flight.key })
        );
        assert!(!host.has_overrides(1));
        assert_eq!(driver.in_flight(), 0);
    }

    #[test]
    fn superseded_timers_are_ignored() {
        let mut host = MockHost::new(0);
        let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        host.place(1, Rect::new(0.0, 50.0, 10.0, 10.0));
        let mut driver = AnimationDriver::new(FlipOptions::default());
        let first = driver.animate(&mut host, &keys, &mut store, 1, false).unwrap();

        // Layout moves again before the release fires.
        host.place(1, Rect::new(0.0, 80.0, 10.0, 10.0));
        let second = driver.animate(&mut host, &keys, &mut store, 1, false).unwrap();
        assert!(second.generation > first.generation);
        // Restarted from where it visually was: the first snapped position.
        assert_eq!(second.offset, Offset::new(0.0, -80.0));

        let (_, stale) = host.next_timer().unwrap();
        assert_eq!(stale.generation, first.generation);
        assert_eq!(driver.on_timer(&mut host, stale), None);
        assert_eq!(driver.phase_of(second.key), Some(Phase::Snapped));

        let (_, current) = host.next_timer().unwrap();
        assert!(driver.on_timer(&mut host, current).is_some());
        assert_eq!(driver.phase_of(second.key), Some(Phase::Settling));
    }

    #[test]
    fn retrigger_without_layout_change_is_a_no_op() {
        let mut host = MockHost::new(0);
        let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        host.place(1, Rect::new(0.0, 50.0, 10.0, 10.0));
        let mut driver = AnimationDriver::new(FlipOptions::default());
        let flight = driver.animate(&mut host, &keys, &mut store, 1, false).unwrap();
        let writes = host.writes.len();

        assert_eq!(
            driver.animate(&mut host, &keys, &mut store, 1, false),
            Err(SkipReason::AlreadySnapped(flight.key))
        );
        assert_eq!(host.writes.len(), writes);
        assert_eq!(host.scheduled.len(), 1);
    }

    #[test]
    fn settling_element_is_left_alone() {
        let mut host = MockHost::new(0);
        let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        host.place(1, Rect::new(0.0, 50.0, 10.0, 10.0));
        let mut driver = AnimationDriver::new(FlipOptions::default());
        let flight = driver.animate(&mut host, &keys, &mut store, 1, false).unwrap();
        let (_, release) = host.next_timer().unwrap();
        driver.on_timer(&mut host, release);

        host.place(1, Rect::new(0.0, 90.0, 10.0, 10.0));
        assert_eq!(
            driver.animate(&mut host, &keys, &mut store, 1, false),
            Err(SkipReason::Settling(flight.key))
        );
        assert_eq!(driver.phase_of(flight.key), Some(Phase::Settling));
        assert_eq!(host.scheduled.len(), 1);
    }

    #[test]
    fn forgotten_flight_ignores_its_timers() {
        let mut host = MockHost::new(0);
        let (keys, mut store) = tracked(&mut host, &[(1, Rect::new(0.0, 0.0, 10.0, 10.0))]);
        host.place(1, Rect::new(0.0, 50.0, 10.0, 10.0));
        let mut driver = AnimationDriver::new(FlipOptions::default());
        let flight = driver.animate(&mut host, &keys, &mut store, 1, false).unwrap();

        driver.forget(&mut host, flight.key);
        assert!(!host.has_overrides(1));
        let (_, token) = host.next_timer().unwrap();
        assert_eq!(driver.on_timer(&mut host, token), None);
    }
}
