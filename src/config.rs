use core::fmt;

use embassy_time::Duration;

/// Timing windows for the crash gesture.
///
/// `swipe_min_period`/`swipe_max_period` bound both how long one swipe must last and how
/// long the rest between two swipes may be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureTiming {
    /// Budget for the whole attempt, measured from its first interrupt.
    pub pattern_max_period: Duration,
    /// Largest gap between two interrupts of the same swipe.
    pub swipe_max_interval: Duration,
    pub swipe_min_period: Duration,
    pub swipe_max_period: Duration,
    pub target_swipe_count: u8,
}

include!(concat!(env!("OUT_DIR"), "/gesture_config.rs"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingError {
    ZeroSwipeInterval,
    SwipeMinNotAboveInterval,
    SwipeMaxBelowMin,
    ZeroTargetCount,
    PatternTooShort { required: Duration },
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSwipeInterval => f.write_str("swipe max interval must be > 0"),
            Self::SwipeMinNotAboveInterval => {
                f.write_str("swipe min period must be > swipe max interval")
            }
            Self::SwipeMaxBelowMin => f.write_str("swipe max period must be >= swipe min period"),
            Self::ZeroTargetCount => f.write_str("target swipe count must be >= 1"),
            Self::PatternTooShort { required } => write!(
                f,
                "pattern max period must be >= {} ms",
                required.as_millis()
            ),
        }
    }
}

impl GestureTiming {
    /// Same rules the config compiler applies to `config/gesture.toml`.
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.swipe_max_interval.as_ticks() == 0 {
            return Err(TimingError::ZeroSwipeInterval);
        }
        if self.swipe_min_period <= self.swipe_max_interval {
            return Err(TimingError::SwipeMinNotAboveInterval);
        }
        if self.swipe_max_period < self.swipe_min_period {
            return Err(TimingError::SwipeMaxBelowMin);
        }
        if self.target_swipe_count == 0 {
            return Err(TimingError::ZeroTargetCount);
        }

        let segments = 2 * self.target_swipe_count as u64 - 1;
        let required_ticks = self
            .swipe_min_period
            .as_ticks()
            .saturating_mul(segments);
        if self.pattern_max_period.as_ticks() < required_ticks {
            return Err(TimingError::PatternTooShort {
                required: Duration::from_ticks(required_ticks),
            });
        }

        Ok(())
    }
}

impl Default for GestureTiming {
    fn default() -> Self {
        DEFAULT_GESTURE_TIMING
    }
}
