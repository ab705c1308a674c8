//! Trap adapter.
//!
//! Installs handlers for the hardware fault signals a platform uses to report
//! arithmetic overflow and forwards recognised overflow traps to the
//! registered [`foundation::TrapOps`]. Anything it cannot classify is handed
//! back to the handler that was installed before it, which normally means the
//! process dies.
//!
//! | Platform     | Signal  | Classification                       |
//! |--------------|---------|--------------------------------------|
//! | macOS        | SIGFPE  | always overflow                      |
//! | Linux x86_64 | SIGFPE  | always overflow                      |
//! | Linux x86    | SIGSEGV | overflow when the trap vector is 4   |
//! | other        | none    | faults crash the process             |

use cfg_if::cfg_if;

mod error;
#[cfg_attr(not(unix), allow(dead_code))]
mod machine;
mod plan;
mod platform;

pub use error::SignalError;
pub use plan::{AccessRule, AccessTrap, FaultMeta, Signal, TrapPlan, X86_OVERFLOW_VECTOR};
pub use platform::{Arch, Os, Platform};

cfg_if! {
    if #[cfg(unix)] {
        mod install;
        pub use install::{arm, handler_address, is_armed, ArmedTraps};
    } else {
        mod unsupported;
        pub use unsupported::{arm, handler_address, is_armed, ArmedTraps};
    }
}
