//! Process-wide bridge configuration.

use derive_builder::Builder;

use context::CaptureMode;
use foundation::utils::GlobalOption;
use foundation::{ResultCode, OVERFLOW_CODE};
use signal::TrapPlan;

use crate::error::GuardError;
use crate::{guard, trap_glue};

/// Called from the overflow signal handler. Must only do async-signal-safe
/// work and should end by calling [`crate::report_failure`].
pub type OverflowHook = extern "C" fn();

/// Which fault handlers a guard arms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrapSelection {
    /// The platform table in [`TrapPlan::detect`].
    #[default]
    Detect,
    /// No handlers; every hardware fault kills the process.
    Disabled,
    Plan(TrapPlan),
}

impl TrapSelection {
    pub fn resolve(&self) -> TrapPlan {
        if !context::SUPPORTED {
            // Without a capture primitive a handler has nowhere to go.
            return TrapPlan::none();
        }
        match *self {
            TrapSelection::Detect => TrapPlan::detect(),
            TrapSelection::Disabled => TrapPlan::none(),
            TrapSelection::Plan(plan) => plan,
        }
    }
}

/// How a failure reported from ordinary code travels back to its guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferMode {
    /// Unwinds with a sentinel payload. Destructors of abandoned frames run.
    /// Aborts if an `extern "C"` frame or a `panic = "abort"` build is in the way.
    Unwind,
    /// Resumes the saved context directly, like a trap does. Crosses foreign
    /// frames, but destructors of abandoned frames never run.
    Resume,
}

impl Default for TransferMode {
    fn default() -> Self {
        if cfg!(panic = "abort") {
            TransferMode::Resume
        } else {
            TransferMode::Unwind
        }
    }
}

impl TransferMode {
    /// Falls back to unwinding where there is no context to resume into.
    pub fn resolve(self) -> TransferMode {
        if context::SUPPORTED {
            self
        } else {
            TransferMode::Unwind
        }
    }
}

#[derive(Clone, Debug, Builder)]
#[builder(default)]
pub struct Config {
    pub capture: CaptureMode,
    pub traps: TrapSelection,
    pub transfer: TransferMode,
    /// Code the default overflow hook reports.
    pub overflow_code: ResultCode,
    #[builder(setter(strip_option))]
    pub overflow_hook: Option<OverflowHook>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureMode::Fast,
            traps: TrapSelection::Detect,
            transfer: TransferMode::default(),
            overflow_code: OVERFLOW_CODE,
            overflow_hook: None,
        }
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        let hook_address = |config: &Config| config.overflow_hook.map(|hook| hook as usize);
        self.capture == other.capture
            && self.traps == other.traps
            && self.transfer == other.transfer
            && self.overflow_code == other.overflow_code
            && hook_address(self) == hook_address(other)
    }
}

impl Eq for Config {}

static CONFIG: GlobalOption<Config> = GlobalOption::none();

/// Replaces the configuration used by every following guard.
pub fn init(config: Config) -> Result<(), GuardError> {
    if guard::is_active() {
        return Err(GuardError::AlreadyActive);
    }
    log::debug!("trapline configured: {:?}", config);
    CONFIG.set(config);
    Ok(())
}

/// Drops the configuration and unregisters the overflow glue.
pub fn teardown() -> Result<(), GuardError> {
    if guard::is_active() {
        return Err(GuardError::AlreadyActive);
    }
    CONFIG.take();
    trap_glue::uninstall();
    Ok(())
}

pub fn current_config() -> Config {
    CONFIG.with_some(Config::clone).unwrap_or_default()
}
