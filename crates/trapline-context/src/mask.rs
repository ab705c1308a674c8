use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(unix)] {
        use core::ptr;

        /// Snapshot of the calling thread's blocked-signal set.
        #[derive(Clone, Copy)]
        pub struct SignalMask(libc::sigset_t);

        impl SignalMask {
            pub fn current() -> Self {
                let mut set: libc::sigset_t = unsafe { core::mem::zeroed() };
                unsafe { libc::pthread_sigmask(libc::SIG_SETMASK, ptr::null(), &mut set) };
                Self(set)
            }

            /// Reinstalls the snapshot. Async-signal-safe.
            pub fn restore(&self) {
                unsafe { libc::pthread_sigmask(libc::SIG_SETMASK, &self.0, ptr::null_mut()) };
            }

            pub fn contains(&self, signal: libc::c_int) -> bool {
                unsafe { libc::sigismember(&self.0, signal) == 1 }
            }
        }
    } else {
        #[derive(Clone, Copy)]
        pub struct SignalMask;

        impl SignalMask {
            pub fn current() -> Self {
                Self
            }

            pub fn restore(&self) {}

            pub fn contains(&self, _signal: libc::c_int) -> bool {
                false
            }
        }
    }
}
