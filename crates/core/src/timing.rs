//! Fixed-timestep pacing.
//!
//! Frontends present frames at whatever rate the window allows, but the
//! emulated machine must advance in fixed 1/60 s ticks so that timer decay
//! does not depend on the rendering frame rate or the instruction rate.
//! [`TickAccumulator`] converts elapsed wall-clock time into a number of
//! whole ticks to run.

use std::time::Duration;

/// Simulation ticks per second
pub const TICKS_PER_SECOND: u32 = 60;

/// Wall-clock length of one tick
pub const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICKS_PER_SECOND as u64);

/// Accumulates elapsed time and hands it back as whole ticks.
#[derive(Debug, Clone)]
pub struct TickAccumulator {
    accumulated: Duration,
    max_ticks_per_advance: u32,
}

impl Default for TickAccumulator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl TickAccumulator {
    /// `max_ticks_per_advance` bounds catch-up after a stall; backlog beyond it is dropped.
    pub fn new(max_ticks_per_advance: u32) -> Self {
        Self {
            accumulated: Duration::ZERO,
            max_ticks_per_advance: max_ticks_per_advance.max(1),
        }
    }

    /// Add `elapsed` and return how many ticks are due now.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        let mut ticks = 0;
        while self.accumulated >= TICK_DURATION {
            self.accumulated -= TICK_DURATION;
            ticks += 1;
            if ticks == self.max_ticks_per_advance {
                self.accumulated = Duration::ZERO;
                break;
            }
        }
        ticks
    }

    /// Time carried over towards the next tick
    pub fn pending(&self) -> Duration {
        self.accumulated
    }

    /// Drop any carried-over time (used when resuming from pause)
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tick_before_duration() {
        let mut acc = TickAccumulator::default();
        assert_eq!(acc.advance(TICK_DURATION / 2), 0);
        assert_eq!(acc.pending(), TICK_DURATION / 2);
    }

    #[test]
    fn test_remainder_carries_over() {
        let mut acc = TickAccumulator::default();
        assert_eq!(acc.advance(TICK_DURATION / 2), 0);
        assert_eq!(acc.advance(TICK_DURATION / 2), 1);
        assert_eq!(acc.pending(), Duration::ZERO);
    }

    #[test]
    fn test_multiple_ticks_in_one_advance() {
        let mut acc = TickAccumulator::default();
        assert_eq!(acc.advance(TICK_DURATION * 3), 3);
    }

    #[test]
    fn test_one_second_is_sixty_ticks() {
        let mut acc = TickAccumulator::new(1000);
        let mut total = 0;
        // Presentation at 144 Hz must still yield 60 ticks per second.
        for _ in 0..144 {
            total += acc.advance(Duration::from_secs(1) / 144);
        }
        assert!((59..=60).contains(&total), "got {} ticks", total);
    }

    #[test]
    fn test_backlog_is_capped() {
        let mut acc = TickAccumulator::new(4);
        assert_eq!(acc.advance(Duration::from_secs(2)), 4);
        assert_eq!(acc.pending(), Duration::ZERO);
    }

    #[test]
    fn test_reset_drops_pending() {
        let mut acc = TickAccumulator::default();
        acc.advance(TICK_DURATION / 3);
        acc.reset();
        assert_eq!(acc.pending(), Duration::ZERO);
    }
}
