//! Fixed-rate tick scheduler for the session loop.
//!
//! The session is polled, not event driven, so the client sleeps between
//! ticks. A tick that runs late is taken immediately; once the loop falls more
//! than [`MAX_LAG`] behind, the missed ticks are dropped instead of replayed.

use std::time::{Duration, Instant};

use tracing::warn;

/// Lag beyond which missed ticks are skipped rather than caught up.
pub const MAX_LAG: Duration = Duration::from_millis(250);

/// Fixed-rate tick scheduler.
pub struct TickLoop {
    interval: Duration,
    next_tick: Instant,
    tick_count: u64,
    skipped: u64,
}

impl TickLoop {
    /// First tick is due immediately.
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_tick: start,
            tick_count: 0,
            skipped: 0,
        }
    }

    /// Sleep until the next tick is due.
    pub fn wait(&mut self) {
        let delay = self.schedule(Instant::now());
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    /// Claim the tick due at or after `now`: returns how long to sleep before
    /// running it and schedules the following one.
    pub fn schedule(&mut self, now: Instant) -> Duration {
        let delay = if now < self.next_tick {
            let delay = self.next_tick - now;
            self.next_tick += self.interval;
            delay
        } else {
            let lag = now - self.next_tick;
            if lag > MAX_LAG {
                let missed = (lag.as_nanos() / self.interval.as_nanos()) as u64;
                warn!(
                    "Tick loop {:.1}ms behind, skipping {missed} ticks",
                    lag.as_secs_f64() * 1000.0
                );
                self.skipped += missed;
                self.next_tick = now + self.interval;
            } else {
                self.next_tick += self.interval;
            }
            Duration::ZERO
        };

        self.tick_count += 1;
        delay
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Ticks dropped because the loop fell behind.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);

    #[test]
    fn test_first_tick_is_immediate() {
        let start = Instant::now();
        let mut ticks = TickLoop::starting_at(INTERVAL, start);
        assert_eq!(ticks.schedule(start), Duration::ZERO);
        assert_eq!(ticks.tick_count(), 1);
    }

    #[test]
    fn test_waits_for_next_tick() {
        let start = Instant::now();
        let mut ticks = TickLoop::starting_at(INTERVAL, start);
        ticks.schedule(start);

        let delay = ticks.schedule(start + Duration::from_millis(10));
        assert_eq!(delay, Duration::from_millis(40));
    }

    #[test]
    fn test_schedule_does_not_drift() {
        let start = Instant::now();
        let mut ticks = TickLoop::starting_at(INTERVAL, start);

        for i in 0..10u32 {
            // Woken 3ms after each tick was due.
            let now = start + INTERVAL * i + Duration::from_millis(3);
            ticks.schedule(now);
        }
        let delay = ticks.schedule(start + INTERVAL * 10);
        assert_eq!(delay, Duration::ZERO, "tick 10 is due exactly now");
        assert_eq!(ticks.schedule(start + INTERVAL * 10), INTERVAL);
    }

    #[test]
    fn test_small_lag_is_caught_up() {
        let start = Instant::now();
        let mut ticks = TickLoop::starting_at(INTERVAL, start);
        ticks.schedule(start);

        let late = start + Duration::from_millis(120);
        assert_eq!(ticks.schedule(late), Duration::ZERO);
        assert_eq!(ticks.schedule(late), Duration::ZERO);
        assert_eq!(ticks.skipped(), 0);
        assert_eq!(ticks.schedule(late), Duration::from_millis(30));
    }

    #[test]
    fn test_large_lag_skips_missed_ticks() {
        let start = Instant::now();
        let mut ticks = TickLoop::starting_at(INTERVAL, start);
        ticks.schedule(start);

        let stalled = start + Duration::from_secs(1);
        assert_eq!(ticks.schedule(stalled), Duration::ZERO);
        assert_eq!(ticks.skipped(), 19);
        assert_eq!(ticks.schedule(stalled), INTERVAL);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let ticks = TickLoop::new(Duration::ZERO);
        assert_eq!(ticks.interval(), Duration::from_millis(1));
    }
}
