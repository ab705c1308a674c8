//! Shared ground for the trapline crates: result codes, the register-file
//! trait implemented per architecture, the trap ops table that signal handlers
//! call through, and process-wide cells.

#![no_std]

pub mod arch;
pub mod code;
pub mod kfn;
pub mod ops;
pub mod utils;

pub use arch::RegisterFile;
pub use code::{ResultCode, OVERFLOW_CODE, RUN_REJECTED_CODE};
pub use ops::TrapOps;
