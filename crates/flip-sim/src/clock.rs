//! Virtual time and the single-shot timer queue.

use flip_engine::TimerToken;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pending {
    due: f64,
    seq: u64,
    token: TimerToken,
}

/// Millisecond clock that only moves when told to.
///
/// Timers due at the same instant fire in the order they were scheduled.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: f64,
    seq: u64,
    pending: Vec<Pending>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn schedule(&mut self, delay_ms: f64, token: TimerToken) {
        let due = self.now + delay_ms.max(0.0);
        self.pending.push(Pending {
            due,
            seq: self.seq,
            token,
        });
        self.seq += 1;
    }

    /// Remove the earliest timer due at or before `until` and move the clock
    /// to its due time.
    pub fn pop_due(&mut self, until: f64) -> Option<(f64, TimerToken)> {
        let (index, next) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by(|a, b| a.1.due.total_cmp(&b.1.due).then(a.1.seq.cmp(&b.1.seq)))
            .map(|(index, p)| (index, *p))?;
        self.pending.swap_remove(index);
        self.now = self.now.max(next.due);
        Some((next.due, next.token))
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, at: f64) {
        self.now = self.now.max(at);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Due time of the next timer, if any.
    pub fn next_due(&self) -> Option<f64> {
        self.pending.iter().map(|p| p.due).min_by(f64::total_cmp)
    }
}
