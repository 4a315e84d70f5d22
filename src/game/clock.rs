//! Game clock derived from wall time
//!
//! Every timestamp gameplay compares against (cooldowns, invulnerability,
//! buff expiry, spawn schedule, beam pulses) is read from here. Time spent
//! suspended never reaches the game clock, so pausing cannot expire a timer.

/// Wall-clock ms minus accumulated suspended duration
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    suspended_total: u64,
    suspended_at: Option<u64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Game time at the given wall time; frozen while suspended
    pub fn now(&self, wall_ms: u64) -> u64 {
        let wall = self.suspended_at.map_or(wall_ms, |at| at.min(wall_ms));
        wall.saturating_sub(self.suspended_total)
    }

    /// Start a suspension; a second call while suspended is ignored
    pub fn suspend(&mut self, wall_ms: u64) {
        if self.suspended_at.is_none() {
            self.suspended_at = Some(wall_ms);
        }
    }

    pub fn resume(&mut self, wall_ms: u64) {
        if let Some(at) = self.suspended_at.take() {
            self.suspended_total += wall_ms.saturating_sub(at);
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }

    /// Total wall time spent suspended so far
    pub fn suspended_total(&self) -> u64 {
        self.suspended_total
    }
}
