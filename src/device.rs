use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::RawMutex, Mutex};
use embassy_time::Instant;

use crate::{
    config::{GestureTiming, TimingError},
    detector::{DetectorStep, GestureDetector, InterruptClaim},
    fault::FaultTrigger,
    power::{
        InterruptLine, MonitorState, MonitorSubscription, PolicyOutcome, PowerNotifier,
        PowerPolicy, PowerSettingError, PowerSettingId, SubscriptionError, GUID_MONITOR_POWER_ON,
    },
};

/// Per-device state shared by the touch ISR and the display power callback.
///
/// The detector half is only touched from [`DeviceContext::on_touch_interrupt`] and the
/// policy half only from [`DeviceContext::on_power_setting_change`].
pub struct DeviceContext<F, I, R> {
    detector: GestureDetector,
    fault: F,
    power: PowerPolicy<I>,
    monitor_notification: MonitorSubscription<R>,
    torn_down: bool,
}

impl<F, I, R> DeviceContext<F, I, R>
where
    F: FaultTrigger,
    I: InterruptLine,
{
    pub fn new(fault: F, interrupt: I) -> Self {
        Self::from_parts(GestureDetector::new(), fault, interrupt)
    }

    pub fn with_timing(timing: GestureTiming, fault: F, interrupt: I) -> Result<Self, TimingError> {
        Ok(Self::from_parts(
            GestureDetector::with_timing(timing)?,
            fault,
            interrupt,
        ))
    }

    fn from_parts(detector: GestureDetector, fault: F, interrupt: I) -> Self {
        Self {
            detector,
            fault,
            power: PowerPolicy::new(interrupt),
            monitor_notification: MonitorSubscription::new(),
            torn_down: false,
        }
    }

    /// Registers for display power notifications.
    pub fn start<N>(&mut self, notifier: &mut N) -> Result<(), SubscriptionError<N::Error>>
    where
        N: PowerNotifier<Registration = R>,
    {
        self.monitor_notification.register(notifier)?;
        self.torn_down = false;
        log::info!("power: monitor_notification=registered");
        Ok(())
    }

    /// Releases the display power registration. Safe to call more than once.
    pub fn teardown<N>(&mut self, notifier: &mut N)
    where
        N: PowerNotifier<Registration = R>,
    {
        if self.monitor_notification.release(notifier) {
            log::info!("power: monitor_notification=released");
        }
        self.torn_down = true;
    }

    pub fn on_touch_interrupt(&mut self, now: Instant) -> InterruptClaim {
        self.detector.on_touch_interrupt(now, &mut self.fault)
    }

    /// Same as [`Self::on_touch_interrupt`] but reports what the interrupt did.
    pub fn process_touch_interrupt(&mut self, now: Instant) -> DetectorStep {
        self.detector.process(now, &mut self.fault)
    }

    pub fn on_power_setting_change(
        &mut self,
        setting: PowerSettingId,
        value: Option<&[u8]>,
    ) -> Result<PolicyOutcome, PowerSettingError> {
        if self.torn_down {
            log::debug!("power: notification_after_teardown ignored");
            return Ok(PolicyOutcome::Ignored);
        }
        self.power.on_power_setting_change(setting, value)
    }

    pub fn detector(&self) -> &GestureDetector {
        &self.detector
    }

    pub fn fault(&self) -> &F {
        &self.fault
    }

    pub fn interrupt(&self) -> &I {
        self.power.interrupt()
    }

    pub fn last_monitor_state(&self) -> MonitorState {
        self.power.last_monitor_state()
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor_notification.is_registered()
    }
}

/// [`DeviceContext`] behind a per-device lock, for hosts that may run the touch ISR and
/// the power callback concurrently.
///
/// Use a raw mutex that masks the touch interrupt (e.g. `CriticalSectionRawMutex`) so the
/// ISR never spins on a lock held by the power callback.
pub struct SharedDevice<M: RawMutex, F, I, R> {
    inner: Mutex<M, RefCell<DeviceContext<F, I, R>>>,
}

impl<M, F, I, R> SharedDevice<M, F, I, R>
where
    M: RawMutex,
    F: FaultTrigger,
    I: InterruptLine,
{
    pub fn new(device: DeviceContext<F, I, R>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(device)),
        }
    }

    pub fn on_touch_interrupt(&self, now: Instant) -> InterruptClaim {
        self.inner
            .lock(|device| device.borrow_mut().on_touch_interrupt(now))
    }

    pub fn on_power_setting_change(
        &self,
        setting: PowerSettingId,
        value: Option<&[u8]>,
    ) -> Result<PolicyOutcome, PowerSettingError> {
        self.inner
            .lock(|device| device.borrow_mut().on_power_setting_change(setting, value))
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut DeviceContext<F, I, R>) -> T) -> T {
        self.inner.lock(|device| f(&mut device.borrow_mut()))
    }
}

/// Entry point for the host's raw power setting callback, whose context may be missing.
pub fn dispatch_power_setting<M, F, I, R>(
    device: Option<&SharedDevice<M, F, I, R>>,
    setting: PowerSettingId,
    value: Option<&[u8]>,
) -> Result<PolicyOutcome, PowerSettingError>
where
    M: RawMutex,
    F: FaultTrigger,
    I: InterruptLine,
{
    if setting != GUID_MONITOR_POWER_ON {
        return Ok(PolicyOutcome::Ignored);
    }
    let Some(device) = device else {
        log::warn!("power: notification_rejected err={}", PowerSettingError::MissingContext);
        return Err(PowerSettingError::MissingContext);
    };
    device.on_power_setting_change(setting, value)
}
