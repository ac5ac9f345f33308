use super::state_machine::{TimerRequest, TimerToken};
use std::time::Duration;

/// Host side of tick scheduling: receives schedule/cancel requests from the controller.
pub trait TickScheduler {
    fn apply(&mut self, request: &TimerRequest);
}

/// 固定频率时钟
///
/// Accumulates elapsed time from whatever loop drives the host and reports which ticks are
/// due. Catch-up after a long stall is capped; the remaining backlog is dropped.
#[derive(Debug, Clone)]
pub struct FrameClock {
    active: Option<(TimerToken, Duration)>,
    accumulator: Duration,
    max_catch_up: u32,
}

impl FrameClock {
    pub fn new(max_catch_up: u32) -> Self {
        Self {
            active: None,
            accumulator: Duration::ZERO,
            max_catch_up: max_catch_up.max(1),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.active.map(|(_, interval)| interval)
    }

    /// Advance by `delta` and return the tokens of the ticks now due.
    pub fn advance(&mut self, delta: Duration) -> Vec<TimerToken> {
        let Some((token, interval)) = self.active else {
            return Vec::new();
        };
        if interval.is_zero() {
            return Vec::new();
        }

        self.accumulator = self.accumulator.saturating_add(delta);
        let elapsed = self.accumulator.as_nanos();
        let period = interval.as_nanos();
        let count = elapsed / period;
        self.accumulator = nanos_to_duration(elapsed % period);

        let due = count.min(self.max_catch_up as u128) as usize;
        vec![token; due]
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TickScheduler for FrameClock {
    fn apply(&mut self, request: &TimerRequest) {
        match *request {
            TimerRequest::Schedule { token, interval } => {
                self.active = Some((token, interval));
                self.accumulator = Duration::ZERO;
            }
            TimerRequest::Cancel { token } => {
                if matches!(self.active, Some((active, _)) if active == token) {
                    self.active = None;
                    self.accumulator = Duration::ZERO;
                }
            }
        }
    }
}
