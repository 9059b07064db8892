mod core;

use embassy_time::Instant;

pub use self::core::{Attempt, DetectorStep, ResetReason, SwipeDetector};
use crate::{
    config::{GestureTiming, TimingError},
    fault::FaultTrigger,
};

/// ISR verdict, mirroring the boolean a host interrupt service routine returns.
/// The gesture handler only observes the line, so it never claims it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptClaim {
    Claimed,
    NotClaimed,
}

impl InterruptClaim {
    pub fn is_claimed(self) -> bool {
        matches!(self, Self::Claimed)
    }
}

/// Detector half of the device context: swipe timing plus the fault it fires.
pub struct GestureDetector {
    inner: SwipeDetector,
    timing: GestureTiming,
}

impl Default for GestureDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureDetector {
    pub fn new() -> Self {
        let timing = GestureTiming::default();
        Self {
            inner: SwipeDetector::new(timing),
            timing,
        }
    }

    pub fn with_timing(timing: GestureTiming) -> Result<Self, TimingError> {
        Ok(Self {
            inner: SwipeDetector::with_timing(timing)?,
            timing,
        })
    }

    pub fn timing(&self) -> GestureTiming {
        self.timing
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        self.inner.attempt()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.is_idle()
    }

    /// Runs one interrupt through the detector and fires `fault` when the pattern completes.
    /// The detector is already idle again when `fault` runs.
    pub fn process<F>(&mut self, now: Instant, fault: &mut F) -> DetectorStep
    where
        F: FaultTrigger + ?Sized,
    {
        let step = self.inner.tick(now);
        if step == DetectorStep::PatternComplete {
            fault.trigger_fault();
        }
        step
    }

    pub fn on_touch_interrupt<F>(&mut self, now: Instant, fault: &mut F) -> InterruptClaim
    where
        F: FaultTrigger + ?Sized,
    {
        let _ = self.process(now, fault);
        InterruptClaim::NotClaimed
    }
}

#[cfg(test)]
mod tests {
    use embassy_time::Duration;

    use super::*;

    #[derive(Default)]
    struct FaultSpy {
        fired: u32,
    }

    impl FaultTrigger for FaultSpy {
        fn trigger_fault(&mut self) {
            self.fired += 1;
        }
    }

    fn drive_swipe(
        detector: &mut GestureDetector,
        fault: &mut FaultSpy,
        start_ms: u64,
        end_ms: u64,
    ) -> InterruptClaim {
        let mut claim = InterruptClaim::NotClaimed;
        let mut t = start_ms;
        while t <= end_ms {
            claim = detector.on_touch_interrupt(Instant::from_millis(t), fault);
            t += 100;
        }
        claim
    }

    #[test]
    fn never_claims_the_interrupt() {
        let mut detector = GestureDetector::new();
        let mut fault = FaultSpy::default();

        let claim = detector.on_touch_interrupt(Instant::from_millis(0), &mut fault);

        assert_eq!(claim, InterruptClaim::NotClaimed);
        assert!(!claim.is_claimed());
    }

    #[test]
    fn fault_fires_once_when_target_reached() {
        let mut detector = GestureDetector::new();
        let mut fault = FaultSpy::default();

        for start in [0u64, 11_100, 22_200] {
            drive_swipe(&mut detector, &mut fault, start, start + 5_100);
        }
        assert_eq!(fault.fired, 0);
        assert_eq!(detector.attempt().map(|a| a.swipe_count), Some(3));

        let claim = drive_swipe(&mut detector, &mut fault, 33_300, 38_400);

        assert_eq!(claim, InterruptClaim::NotClaimed);
        assert_eq!(fault.fired, 1);
        assert!(detector.is_idle());
    }

    #[test]
    fn rejects_invalid_timing() {
        let timing = GestureTiming {
            target_swipe_count: 0,
            ..GestureTiming::default()
        };

        assert_eq!(
            GestureDetector::with_timing(timing).err(),
            Some(TimingError::ZeroTargetCount)
        );
    }

    #[test]
    fn keeps_accepted_timing() {
        let timing = GestureTiming {
            swipe_max_interval: Duration::from_millis(250),
            ..GestureTiming::default()
        };

        let detector = GestureDetector::with_timing(timing).expect("timing should validate");

        assert_eq!(detector.timing(), timing);
        assert!(detector.is_idle());
    }
}
