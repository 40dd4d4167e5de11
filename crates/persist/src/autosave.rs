use std::time::Duration;

use crate::store::{LevelRecord, LevelStore};

/// Interval between automatic saves.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Result of polling the autosave timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveOutcome {
    NotDue,
    Saved,
    /// The save failed and was logged; the timer keeps running.
    Failed,
}

/// Fixed-interval save timer driven by frame deltas.
#[derive(Debug, Clone)]
pub struct Autosave {
    interval: Duration,
    elapsed: Duration,
}

impl Default for Autosave {
    fn default() -> Self {
        Self::new(AUTOSAVE_INTERVAL)
    }
}

impl Autosave {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advance the timer. Returns true once per elapsed interval.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.elapsed += dt;
        if self.interval.is_zero() || self.elapsed < self.interval {
            return false;
        }
        // a long stall fires once, not once per missed interval
        self.elapsed = Duration::ZERO;
        true
    }

    /// Restart the interval, e.g. after a manual save.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Advance the timer and save when due. Failures are logged and swallowed.
    pub fn poll(
        &mut self,
        dt: Duration,
        store: &LevelStore,
        record: impl FnOnce() -> LevelRecord,
    ) -> AutosaveOutcome {
        if !self.tick(dt) {
            return AutosaveOutcome::NotDue;
        }
        let record = record();
        match store.save(&record) {
            Ok(()) => AutosaveOutcome::Saved,
            Err(e) => {
                tracing::warn!(name = %record.name, error = %e, "autosave failed, retrying next interval");
                AutosaveOutcome::Failed
            }
        }
    }
}
