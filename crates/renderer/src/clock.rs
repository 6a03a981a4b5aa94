/// Step applied per frame when the caller does not override it.
pub const DEFAULT_TIME_STEP: f32 = 0.02;

/// Fixed-step animation clock.
///
/// Time advances once per rendered frame rather than with the wall clock, so
/// the animation speed follows the display refresh rate. The value is left
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    time: f32,
    dt: f32,
}

impl Clock {
    pub fn new(dt: f32) -> Self {
        Self { time: 0.0, dt }
    }

    pub fn tick(&mut self) -> f32 {
        self.time += self.dt;
        self.time
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = Clock::default();
        assert_eq!(clock.time(), 0.0);
        assert_eq!(clock.dt(), DEFAULT_TIME_STEP);
    }

    #[test]
    fn time_accumulates_fixed_steps() {
        for ticks in [1_u32, 3, 10, 50, 500] {
            let mut clock = Clock::default();
            for _ in 0..ticks {
                clock.tick();
            }
            let expected = ticks as f32 * DEFAULT_TIME_STEP;
            assert!(
                (clock.time() - expected).abs() <= expected * 1e-4,
                "{ticks} ticks gave {}, expected {expected}",
                clock.time()
            );
        }
    }

    #[test]
    fn tick_returns_the_new_time() {
        let mut clock = Clock::new(0.5);
        assert_eq!(clock.tick(), 0.5);
        assert_eq!(clock.tick(), 1.0);
        assert_eq!(clock.time(), 1.0);
    }
}
