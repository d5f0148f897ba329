use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Seconds since the clock started (or was last reset).
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Paces a producer loop at a fixed frame rate.
///
/// Deadlines advance by whole intervals from the start time, so a late frame
/// does not shift every later one. After a stall longer than `dt_max` the
/// schedule restarts from now instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    next_deadline: Instant,
    interval: Duration,
    frame_index: u64,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a clock ticking `fps` times per second (clamped to `1..=1000`).
    pub fn new(fps: u32) -> Self {
        let interval = Duration::from_secs(1) / fps.clamp(1, 1000);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            next_deadline: now,
            interval,
            frame_index: 0,
            dt_max: Duration::from_millis(250), // 0.25s
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Resets the clock baseline.
    ///
    /// Useful when a producer restarts after being stopped.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.start = now;
        self.last = now;
        self.next_deadline = now;
        self.frame_index = 0;
    }

    /// Time left until the next frame is due.
    pub fn until_next(&self, now: Instant) -> Duration {
        self.next_deadline.saturating_duration_since(now)
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last).min(self.dt_max);

        self.next_deadline += self.interval;
        if now.saturating_duration_since(self.next_deadline) > self.dt_max {
            self.next_deadline = now + self.interval;
        }
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_follows_fps() {
        assert_eq!(FrameClock::new(50).interval(), Duration::from_millis(20));
        assert_eq!(FrameClock::new(0).interval(), Duration::from_secs(1));
    }

    #[test]
    fn first_frame_is_due_immediately() {
        let clock = FrameClock::new(30);
        assert_eq!(clock.until_next(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn tick_schedules_next_deadline_and_counts() {
        let mut clock = FrameClock::new(10);
        let a = clock.tick();
        let b = clock.tick();
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
        assert!(clock.until_next(b.now) > Duration::ZERO);
        assert!(b.dt <= 0.25);
    }
}
