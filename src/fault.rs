/// Bug check code used for crashes requested by the operator.
pub const MANUALLY_INITIATED_CRASH: u32 = 0xE2;

/// First bug check parameter; marks the dump as coming from the touch gesture.
pub const GESTURE_CRASH_PARAMETER: usize = 1;

/// Terminal action run once the gesture completes. May never return.
pub trait FaultTrigger {
    fn trigger_fault(&mut self);
}

impl<T: FaultTrigger + ?Sized> FaultTrigger for &mut T {
    fn trigger_fault(&mut self) {
        (**self).trigger_fault();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BugCheck {
    pub code: u32,
    pub parameters: [usize; 4],
}

impl BugCheck {
    pub const fn gesture() -> Self {
        Self {
            code: MANUALLY_INITIATED_CRASH,
            parameters: [GESTURE_CRASH_PARAMETER, 0, 0, 0],
        }
    }
}

/// Kernel debug primitives supplied by the host.
pub trait KernelDebug {
    /// May lag briefly after a debugger attaches or detaches.
    fn debugger_attached(&self) -> bool;
    fn debug_break(&mut self);
    fn bug_check(&mut self, bug_check: BugCheck);
}

/// Breaks into an attached debugger, otherwise bug checks with [`BugCheck::gesture`].
pub struct CrashOnGesture<K> {
    kernel: K,
}

impl<K: KernelDebug> CrashOnGesture<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

impl<K: KernelDebug> FaultTrigger for CrashOnGesture<K> {
    fn trigger_fault(&mut self) {
        if self.kernel.debugger_attached() {
            log::warn!("gesture: fault action=debug_break");
            self.kernel.debug_break();
        } else {
            log::warn!(
                "gesture: fault action=bug_check code=0x{:02x}",
                MANUALLY_INITIATED_CRASH
            );
            self.kernel.bug_check(BugCheck::gesture());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeKernel {
        attached: bool,
        breaks: u32,
        bug_checks: std::vec::Vec<BugCheck>,
    }

    impl KernelDebug for FakeKernel {
        fn debugger_attached(&self) -> bool {
            self.attached
        }

        fn debug_break(&mut self) {
            self.breaks += 1;
        }

        fn bug_check(&mut self, bug_check: BugCheck) {
            self.bug_checks.push(bug_check);
        }
    }

    #[test]
    fn bug_checks_with_gesture_code_without_debugger() {
        let mut trigger = CrashOnGesture::new(FakeKernel::default());

        trigger.trigger_fault();

        assert_eq!(trigger.kernel().breaks, 0);
        assert_eq!(
            trigger.kernel().bug_checks,
            std::vec![BugCheck {
                code: 0xE2,
                parameters: [1, 0, 0, 0],
            }]
        );
    }

    #[test]
    fn breaks_into_attached_debugger() {
        let mut trigger = CrashOnGesture::new(FakeKernel {
            attached: true,
            ..FakeKernel::default()
        });

        trigger.trigger_fault();

        assert_eq!(trigger.kernel().breaks, 1);
        assert!(trigger.kernel().bug_checks.is_empty());
    }
}
