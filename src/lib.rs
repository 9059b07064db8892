//! Forces a crash dump when an operator performs a paced swipe pattern on the touch screen.
//!
//! With the stock `config/gesture.toml`: swipe continuously for 5-15 s, rest for 5-15 s,
//! and repeat; the fourth credited swipe fires the fault trigger. Only interrupt timing is
//! considered. Touch interrupts are delivered only while the display is on.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod detector;
pub mod device;
pub mod fault;
pub mod power;

pub use config::{GestureTiming, TimingError, DEFAULT_GESTURE_TIMING};
pub use detector::{
    Attempt, DetectorStep, GestureDetector, InterruptClaim, ResetReason, SwipeDetector,
};
pub use device::{dispatch_power_setting, DeviceContext, SharedDevice};
pub use embassy_time::{Duration, Instant};
pub use fault::{BugCheck, CrashOnGesture, FaultTrigger, KernelDebug, MANUALLY_INITIATED_CRASH};
pub use power::{
    InterruptLine, MonitorState, PolicyOutcome, PowerNotifier, PowerPolicy, PowerSettingError,
    PowerSettingId, SubscriptionError, GUID_MONITOR_POWER_ON, MONITOR_IS_OFF, MONITOR_IS_ON,
};
