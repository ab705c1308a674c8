//! Glue between the trap adapter and the guard.
//!
//! The adapter calls [`on_overflow_trap`] through the foundation ops table.
//! Everything here runs inside a signal handler, so it only touches atomics
//! and cells written while no guard was armed.

use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use foundation::utils::GlobalCell;
use foundation::{kfn, TrapOps, OVERFLOW_CODE};

use crate::config::{Config, OverflowHook};

static IN_TRAP: AtomicBool = AtomicBool::new(false);
static REPORTED_CODE: AtomicI32 = AtomicI32::new(OVERFLOW_CODE);
static HOOK: GlobalCell<OverflowHook> = GlobalCell::new(default_overflow_hook as OverflowHook);

const TRAP_OPS: TrapOps = TrapOps {
    overflow: on_overflow_trap,
};

/// Must be called with no guard armed.
pub(crate) fn install(config: &Config) {
    REPORTED_CODE.store(config.overflow_code, Ordering::Relaxed);
    HOOK.replace(config.overflow_hook.unwrap_or(default_overflow_hook));
    kfn::trap::register(TRAP_OPS);
}

pub(crate) fn uninstall() {
    kfn::trap::unregister();
    HOOK.replace(default_overflow_hook);
    REPORTED_CODE.store(OVERFLOW_CODE, Ordering::Relaxed);
}

/// Consumes the in-trap flag. True when the caller runs under the overflow hook.
pub(crate) fn take_in_trap() -> bool {
    IN_TRAP.swap(false, Ordering::SeqCst)
}

fn on_overflow_trap() {
    debug::writeln!("[trap] overflow, calling hook");
    IN_TRAP.store(true, Ordering::SeqCst);
    (HOOK.get())();
    // Reached only if the hook returned without transferring.
    IN_TRAP.store(false, Ordering::SeqCst);
}

/// Overflow hook used when none is configured: reports the configured
/// overflow code, [`OVERFLOW_CODE`] by default.
pub extern "C" fn default_overflow_hook() {
    crate::report_failure(REPORTED_CODE.load(Ordering::Relaxed));
}
