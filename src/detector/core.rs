use embassy_time::{Duration, Instant};
use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::config::{GestureTiming, TimingError};

/// Timing record of an attempt in progress. Exists only while the detector is not idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attempt {
    pub pattern_start: Instant,
    pub swipe_start: Instant,
    pub last_interrupt: Instant,
    pub swipe_count: u8,
    /// The current swipe already counted towards `swipe_count`.
    pub swipe_credited: bool,
}

impl Attempt {
    fn begin(now: Instant) -> Self {
        Self {
            pattern_start: now,
            swipe_start: now,
            last_interrupt: now,
            swipe_count: 0,
            swipe_credited: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetReason {
    PatternTimeout { elapsed: Duration },
    RestOutOfWindow { rest: Duration },
    SwipeTooLong { swiping: Duration },
}

/// What a single interrupt did to the detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorStep {
    AttemptStarted,
    Continued,
    SwipeStarted { swipe: u8 },
    SwipeCredited { count: u8 },
    PatternComplete,
    Reset(ResetReason),
}

impl DetectorStep {
    pub fn label(self) -> &'static str {
        match self {
            Self::AttemptStarted => "attempt_started",
            Self::Continued => "continued",
            Self::SwipeStarted { .. } => "swipe_started",
            Self::SwipeCredited { .. } => "swipe_credited",
            Self::PatternComplete => "pattern_complete",
            Self::Reset(ResetReason::PatternTimeout { .. }) => "reset_pattern_timeout",
            Self::Reset(ResetReason::RestOutOfWindow { .. }) => "reset_rest_window",
            Self::Reset(ResetReason::SwipeTooLong { .. }) => "reset_swipe_too_long",
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum DetectorEvent {
    Interrupt { now: Instant },
}

#[derive(Clone, Copy, Debug, Default)]
struct DispatchContext {
    step: Option<DetectorStep>,
}

impl DispatchContext {
    fn emit(&mut self, step: DetectorStep) {
        self.step = Some(step);
    }

    fn finish(self) -> DetectorStep {
        self.step.unwrap_or(DetectorStep::Continued)
    }
}

/// Swipe counting state machine. Allocation-free; one `tick` per touch interrupt.
pub struct SwipeDetector {
    machine: statig::blocking::StateMachine<SwipeHsm>,
}

impl SwipeDetector {
    pub fn with_timing(timing: GestureTiming) -> Result<Self, TimingError> {
        timing.validate()?;
        Ok(Self::new(timing))
    }

    /// Callers must hand in validated timing.
    pub(crate) fn new(timing: GestureTiming) -> Self {
        Self {
            machine: SwipeHsm { timing }.state_machine(),
        }
    }

    pub fn tick(&mut self, now: Instant) -> DetectorStep {
        let mut context = DispatchContext::default();
        self.machine
            .handle_with_context(&DetectorEvent::Interrupt { now }, &mut context);
        context.finish()
    }

    pub fn attempt(&self) -> Option<&Attempt> {
        match self.machine.state() {
            State::Tracking { attempt } => Some(attempt),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.attempt().is_none()
    }
}

struct SwipeHsm {
    timing: GestureTiming,
}

impl SwipeHsm {
    fn reset(&self, context: &mut DispatchContext, reason: ResetReason) -> Outcome<State> {
        match reason {
            ResetReason::PatternTimeout { elapsed } => {
                log::debug!(
                    "gesture: reset reason=pattern_timeout elapsed_ms={}",
                    elapsed.as_millis()
                );
            }
            ResetReason::RestOutOfWindow { rest } => {
                log::debug!("gesture: reset reason=rest_window rest_ms={}", rest.as_millis());
            }
            ResetReason::SwipeTooLong { swiping } => {
                log::debug!(
                    "gesture: reset reason=swipe_too_long swiping_ms={}",
                    swiping.as_millis()
                );
            }
        }
        context.emit(DetectorStep::Reset(reason));
        Transition(State::idle())
    }

    fn outside_swipe_window(&self, span: Duration) -> bool {
        span < self.timing.swipe_min_period || span > self.timing.swipe_max_period
    }
}

#[state_machine(initial = "State::idle()")]
impl SwipeHsm {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &DetectorEvent) -> Outcome<State> {
        match event {
            DetectorEvent::Interrupt { now } => {
                log::info!("gesture: attempt_started");
                context.emit(DetectorStep::AttemptStarted);
                Transition(State::tracking(Attempt::begin(*now)))
            }
        }
    }

    #[state]
    fn tracking(
        &mut self,
        attempt: &mut Attempt,
        context: &mut DispatchContext,
        event: &DetectorEvent,
    ) -> Outcome<State> {
        match event {
            DetectorEvent::Interrupt { now } => {
                let now = *now;

                let elapsed = now.saturating_duration_since(attempt.pattern_start);
                if elapsed > self.timing.pattern_max_period {
                    return self.reset(context, ResetReason::PatternTimeout { elapsed });
                }

                let stopped = now.saturating_duration_since(attempt.last_interrupt);
                let mut swiping = attempt
                    .last_interrupt
                    .saturating_duration_since(attempt.swipe_start);
                attempt.last_interrupt = now;

                let mut swipe_started = false;
                if stopped > self.timing.swipe_max_interval {
                    if self.outside_swipe_window(stopped) {
                        return self.reset(context, ResetReason::RestOutOfWindow { rest: stopped });
                    }
                    attempt.swipe_start = now;
                    attempt.swipe_credited = false;
                    swiping = Duration::from_ticks(0);
                    swipe_started = true;
                    log::debug!(
                        "gesture: swipe_started swipe={}",
                        attempt.swipe_count.saturating_add(1)
                    );
                }

                if swiping > self.timing.swipe_max_period {
                    return self.reset(context, ResetReason::SwipeTooLong { swiping });
                }

                if swiping < self.timing.swipe_min_period || attempt.swipe_credited {
                    if swipe_started {
                        context.emit(DetectorStep::SwipeStarted {
                            swipe: attempt.swipe_count.saturating_add(1),
                        });
                    }
                    return Handled;
                }

                attempt.swipe_count = attempt.swipe_count.saturating_add(1);
                attempt.swipe_credited = true;
                log::info!("gesture: swipe_credited count={}", attempt.swipe_count);

                if attempt.swipe_count == self.timing.target_swipe_count {
                    context.emit(DetectorStep::PatternComplete);
                    return Transition(State::idle());
                }

                context.emit(DetectorStep::SwipeCredited {
                    count: attempt.swipe_count,
                });
                Handled
            }
        }
    }
}
