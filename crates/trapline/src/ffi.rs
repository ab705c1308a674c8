//! C ABI.
//!
//! For hosts whose runtime is not written in Rust. Failures reported through
//! this surface always resume the saved context, so they are safe to raise
//! from foreign frames but never run Rust destructors on the way out.

use libc::c_int;

use foundation::RUN_REJECTED_CODE;

use crate::guard;

/// Runs `func` under a recovery point.
///
/// Returns what `func` returned, the code passed to
/// [`trapline_maybe_return`], the overflow code after an overflow trap, or
/// `RUN_REJECTED_CODE` if `func` is null or a guard is already active.
#[no_mangle]
pub extern "C" fn trapline_run_through(func: Option<extern "C" fn() -> c_int>) -> c_int {
    let Some(func) = func else {
        return RUN_REJECTED_CODE;
    };
    match guard::run_guarded(|| func()) {
        Ok(code) => code,
        Err(err) => {
            log::warn!("trapline_run_through rejected: {}", err);
            RUN_REJECTED_CODE
        }
    }
}

/// Transfers `code` to the active recovery point. Returns normally only when
/// no recovery point is active on this thread.
#[no_mangle]
pub extern "C" fn trapline_maybe_return(code: c_int) {
    guard::transfer_by_resume(code);
}
