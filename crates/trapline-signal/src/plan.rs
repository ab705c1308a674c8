use libc::c_int;

use crate::platform::{Arch, Os, Platform};

/// x86 exception vector raised by `INTO`.
pub const X86_OVERFLOW_VECTOR: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signal(pub c_int);

impl Signal {
    pub const FPE: Signal = Signal(libc::SIGFPE);
    pub const SEGV: Signal = Signal(libc::SIGSEGV);

    #[inline]
    pub const fn raw(self) -> c_int {
        self.0
    }
}

/// What a handler could learn about one fault delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultMeta {
    pub signal: Signal,
    /// CPU exception vector, where the machine context exposes one.
    pub trap_number: Option<usize>,
}

/// Decides whether an invalid-access fault is an overflow trap in disguise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessRule {
    /// Overflow when the fault's trap number is exactly this vector.
    TrapNumber(usize),
}

impl AccessRule {
    /// Runs inside the signal handler; must stay allocation-free.
    #[inline]
    pub fn is_disguised_overflow(&self, meta: &FaultMeta) -> bool {
        match *self {
            AccessRule::TrapNumber(vector) => meta.trap_number == Some(vector),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessTrap {
    pub signal: Signal,
    pub rule: AccessRule,
}

/// Which handlers to install for one arm cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrapPlan {
    /// Every delivery of this signal is an overflow.
    pub overflow: Option<Signal>,
    /// Deliveries of this signal are classified by a rule.
    pub access: Option<AccessTrap>,
}

impl TrapPlan {
    pub const fn none() -> Self {
        Self {
            overflow: None,
            access: None,
        }
    }

    pub fn detect() -> Self {
        Self::for_platform(Platform::current())
    }

    pub fn for_platform(platform: Platform) -> Self {
        match (platform.os, platform.arch) {
            (Os::MacOs, _) => Self::none().with_overflow(Signal::FPE),
            (Os::Linux, Arch::X86_64) => Self::none().with_overflow(Signal::FPE),
            // Linux raises SIGSEGV for the #OF exception.
            (Os::Linux, Arch::X86) => {
                Self::none().with_access(Signal::SEGV, AccessRule::TrapNumber(X86_OVERFLOW_VECTOR))
            }
            _ => Self::none(),
        }
    }

    pub const fn with_overflow(mut self, signal: Signal) -> Self {
        self.overflow = Some(signal);
        self
    }

    pub const fn with_access(mut self, signal: Signal, rule: AccessRule) -> Self {
        self.access = Some(AccessTrap { signal, rule });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.overflow.is_none() && self.access.is_none()
    }

    pub fn signals(&self) -> impl Iterator<Item = Signal> {
        self.overflow
            .into_iter()
            .chain(self.access.map(|access| access.signal))
    }
}
