//! Fault-to-control-flow bridge.
//!
//! [`run_guarded`] establishes one recovery point, arms the trap adapter for
//! the platform and runs the work on top of a saved execution context. From
//! there every failure takes the same road back:
//!
//! - runtime code calls [`report_failure`], which unwinds with a sentinel
//!   payload that only the active guard catches, or resumes the saved context
//!   under [`TransferMode::Resume`] (the default in `panic = "abort"` builds);
//! - an arithmetic-overflow trap lands in a signal handler, which calls the
//!   overflow hook, which calls [`report_failure`]; from signal context the
//!   report resumes the saved context directly instead of unwinding;
//! - a fault the adapter cannot classify is not handled at all and the
//!   process dies.
//!
//! Either way `run_guarded` returns a single result code, with the handlers
//! restored to what they were before.
//!
//! Only one guard may be active in the process. A second `run_guarded` while
//! one is running fails with [`GuardError::AlreadyActive`].

mod config;
mod error;
mod guard;
mod trap_glue;

pub mod fault;
pub mod ffi;

pub use config::{
    current_config, init, teardown, Config, ConfigBuilder, ConfigBuilderError, OverflowHook,
    TransferMode, TrapSelection,
};
pub use context::CaptureMode;
pub use error::GuardError;
pub use foundation::{ResultCode, OVERFLOW_CODE, RUN_REJECTED_CODE};
pub use guard::{
    is_active, report_failure, run_guarded, run_scoped, state, BridgeState, GuardId, Scope,
};
pub use signal::{AccessRule, Platform, Signal, TrapPlan};
pub use trap_glue::default_overflow_hook;
