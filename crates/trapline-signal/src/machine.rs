//! Reading the CPU exception vector out of a signal's machine context.

use cfg_if::cfg_if;
use core::ffi::c_void;

cfg_if! {
    if #[cfg(all(target_os = "linux", target_arch = "x86_64"))] {
        const REG_TRAPNO: usize = 20;

        /// # Safety
        /// `uctx` must be null or the context pointer handed to an `SA_SIGINFO` handler.
        pub(crate) unsafe fn trap_number(uctx: *mut c_void) -> Option<usize> {
            if uctx.is_null() {
                return None;
            }
            let uctx = unsafe { &*uctx.cast::<libc::ucontext_t>() };
            Some(uctx.uc_mcontext.gregs[REG_TRAPNO] as usize)
        }
    } else if #[cfg(all(target_os = "linux", target_arch = "x86"))] {
        const REG_TRAPNO: usize = 12;

        /// # Safety
        /// `uctx` must be null or the context pointer handed to an `SA_SIGINFO` handler.
        pub(crate) unsafe fn trap_number(uctx: *mut c_void) -> Option<usize> {
            if uctx.is_null() {
                return None;
            }
            let uctx = unsafe { &*uctx.cast::<libc::ucontext_t>() };
            Some(uctx.uc_mcontext.gregs[REG_TRAPNO] as usize)
        }
    } else {
        /// # Safety
        /// Never dereferences `uctx`.
        pub(crate) unsafe fn trap_number(_uctx: *mut c_void) -> Option<usize> {
            None
        }
    }
}
