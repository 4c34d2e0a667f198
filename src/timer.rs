use std::time::Instant;

/// Measures the time between frames.
pub struct FrameTimer {
    last: Instant,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds since the previous mark. Starts a new interval.
    pub fn mark(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        elapsed
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use super::*;

    #[test]
    fn mark_measures_since_creation() {
        let mut timer = FrameTimer::new();
        thread::sleep(Duration::from_millis(5));
        assert!(timer.mark() >= 0.005);
    }

    #[test]
    fn mark_starts_a_new_interval() {
        let mut timer = FrameTimer::new();
        thread::sleep(Duration::from_millis(10));
        let elapsed = timer.mark();
        assert!(elapsed >= 0.01);
        assert!(timer.mark() < elapsed);
    }
}
