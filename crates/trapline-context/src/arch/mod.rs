//! Per-architecture capture and resume primitives.
//!
//! `capture_raw` stores the callee-saved state of its caller, then calls the
//! body on top of that frame; `resume_raw` reloads the state and returns from
//! `capture_raw` a second time. Because the capture wraps the body call instead
//! of returning twice, the frame that called `capture_raw` sees an ordinary
//! call that returns exactly once.

use cfg_if::cfg_if;

pub(crate) type Body = extern "C" fn(*mut u8);

cfg_if! {
    if #[cfg(all(target_arch = "x86_64", not(windows)))] {
        mod x86_64;
        pub use self::x86_64::Registers;
        pub(crate) use self::x86_64::{capture_raw, resume_raw};

        pub const SUPPORTED: bool = true;
    } else if #[cfg(all(target_arch = "aarch64", not(windows)))] {
        mod aarch64;
        pub use self::aarch64::Registers;
        pub(crate) use self::aarch64::{capture_raw, resume_raw};

        pub const SUPPORTED: bool = true;
    } else if #[cfg(all(target_arch = "riscv64", target_feature = "d"))] {
        mod riscv64;
        pub use self::riscv64::Registers;
        pub(crate) use self::riscv64::{capture_raw, resume_raw};

        pub const SUPPORTED: bool = true;
    } else {
        mod unsupported;
        pub use self::unsupported::Registers;
        pub(crate) use self::unsupported::{capture_raw, resume_raw};

        pub const SUPPORTED: bool = false;
    }
}
