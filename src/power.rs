use core::{fmt, mem::size_of};

/// Power setting GUID, stored as its 128-bit big-endian value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PowerSettingId(pub u128);

/// {02731015-4510-4526-99E6-E5A17EBD1AEA}
pub const GUID_MONITOR_POWER_ON: PowerSettingId =
    PowerSettingId(0x0273_1015_4510_4526_99e6_e5a1_7ebd_1aea);

pub const MONITOR_IS_OFF: u32 = 0;
pub const MONITOR_IS_ON: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MonitorState {
    On,
    Off,
    /// Nothing processed yet.
    #[default]
    Unknown,
}

impl MonitorState {
    /// Anything other than "on" keeps the touch interrupt quiet.
    pub fn from_raw(raw: u32) -> Self {
        if raw == MONITOR_IS_ON {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// Host-side interrupt object of the touch controller line.
pub trait InterruptLine {
    fn report_active(&mut self);
    fn report_inactive(&mut self);
}

/// Malformed notification. All variants map to an invalid-parameter status for the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerSettingError {
    MissingValue,
    ValueSize { len: usize },
    MissingContext,
}

impl fmt::Display for PowerSettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue => f.write_str("invalid parameter: missing value"),
            Self::ValueSize { len } => write!(
                f,
                "invalid parameter: value is {len} bytes, expected {}",
                size_of::<u32>()
            ),
            Self::MissingContext => f.write_str("invalid parameter: missing context"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// Notification for another power setting.
    Ignored,
    /// Same state as last time; nothing reported.
    Unchanged(MonitorState),
    Reported(MonitorState),
}

pub fn decode_monitor_state(value: Option<&[u8]>) -> Result<MonitorState, PowerSettingError> {
    let value = value.ok_or(PowerSettingError::MissingValue)?;
    let raw: [u8; 4] = value
        .try_into()
        .map_err(|_| PowerSettingError::ValueSize { len: value.len() })?;
    Ok(MonitorState::from_raw(u32::from_ne_bytes(raw)))
}

/// Keeps touch interrupt delivery in step with the display power state.
pub struct PowerPolicy<I> {
    last_monitor_state: MonitorState,
    interrupt: I,
}

impl<I: InterruptLine> PowerPolicy<I> {
    pub fn new(interrupt: I) -> Self {
        Self {
            last_monitor_state: MonitorState::Unknown,
            interrupt,
        }
    }

    pub fn last_monitor_state(&self) -> MonitorState {
        self.last_monitor_state
    }

    pub fn interrupt(&self) -> &I {
        &self.interrupt
    }

    pub fn on_power_setting_change(
        &mut self,
        setting: PowerSettingId,
        value: Option<&[u8]>,
    ) -> Result<PolicyOutcome, PowerSettingError> {
        if setting != GUID_MONITOR_POWER_ON {
            return Ok(PolicyOutcome::Ignored);
        }

        let state = decode_monitor_state(value).map_err(|err| {
            log::warn!("power: notification_rejected err={}", err);
            err
        })?;
        Ok(self.apply(state))
    }

    pub fn apply(&mut self, state: MonitorState) -> PolicyOutcome {
        if state == self.last_monitor_state {
            return PolicyOutcome::Unchanged(state);
        }

        // Recorded before reporting so a re-entrant notification deduplicates.
        self.last_monitor_state = state;
        match state {
            MonitorState::On => {
                log::info!("power: monitor=on touch_irq=active");
                self.interrupt.report_active();
            }
            MonitorState::Off | MonitorState::Unknown => {
                log::info!("power: monitor=off touch_irq=inactive");
                self.interrupt.report_inactive();
            }
        }
        PolicyOutcome::Reported(state)
    }
}

/// Host power-setting notification service.
pub trait PowerNotifier {
    type Registration;
    type Error;

    fn subscribe(&mut self, setting: PowerSettingId) -> Result<Self::Registration, Self::Error>;
    fn unsubscribe(&mut self, registration: Self::Registration);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionError<E> {
    AlreadySubscribed,
    Notifier(E),
}

impl<E: fmt::Display> fmt::Display for SubscriptionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySubscribed => f.write_str("monitor notification already registered"),
            Self::Notifier(err) => write!(f, "monitor notification register failed: {err}"),
        }
    }
}

/// Display-power registration owned by one device. Released at most once.
pub struct MonitorSubscription<R> {
    registration: Option<R>,
}

impl<R> Default for MonitorSubscription<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> MonitorSubscription<R> {
    pub const fn new() -> Self {
        Self { registration: None }
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    pub fn register<N>(&mut self, notifier: &mut N) -> Result<(), SubscriptionError<N::Error>>
    where
        N: PowerNotifier<Registration = R>,
    {
        if self.registration.is_some() {
            return Err(SubscriptionError::AlreadySubscribed);
        }
        let registration = notifier
            .subscribe(GUID_MONITOR_POWER_ON)
            .map_err(SubscriptionError::Notifier)?;
        self.registration = Some(registration);
        Ok(())
    }

    /// Returns whether a registration was released by this call.
    pub fn release<N>(&mut self, notifier: &mut N) -> bool
    where
        N: PowerNotifier<Registration = R>,
    {
        match self.registration.take() {
            Some(registration) => {
                notifier.unsubscribe(registration);
                true
            }
            None => false,
        }
    }
}
