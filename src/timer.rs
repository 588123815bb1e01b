use crate::types::Millis;

/// Periodic trigger and stopwatch driven by a caller supplied millisecond
/// clock.
///
/// `is_due` fires once each time the clock crosses into a new `period` sized
/// bucket. Polls that skip several buckets still fire only once.
#[derive(Debug, Clone)]
pub struct CyclicTimer {
    period: Millis,
    last_bucket: u32,
    started_at: Millis,
    stopped_at: Option<Millis>,
}

impl CyclicTimer {
    /// A zero `period` never fires until [`set_period`](Self::set_period) is
    /// called.
    pub const fn new(period: Millis) -> Self {
        Self {
            period,
            last_bucket: 0,
            started_at: 0,
            stopped_at: Some(0),
        }
    }

    pub fn period(&self) -> Millis {
        self.period
    }

    /// Takes effect at the next bucket boundary of the new period, which can
    /// produce one early or late firing.
    pub fn set_period(&mut self, period: Millis) {
        self.period = period;
    }

    pub fn is_due(&mut self, now: Millis) -> bool {
        let Some(bucket) = now.checked_div(self.period) else {
            return false;
        };

        let fired = bucket != self.last_bucket;
        self.last_bucket = bucket;

        fired
    }

    pub fn start(&mut self, now: Millis) {
        self.started_at = now;
        self.stopped_at = None;
    }

    pub fn stop(&mut self, now: Millis) {
        self.stopped_at = Some(now);
    }

    pub fn is_running(&self) -> bool {
        self.stopped_at.is_none()
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        self.stopped_at.unwrap_or(now).wrapping_sub(self.started_at)
    }
}

impl Default for CyclicTimer {
    fn default() -> Self {
        Self::new(0)
    }
}
