//! Recovery points.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};

use context::{Capture, CaptureMode, SavedContext};
use foundation::ResultCode;

use crate::config::{self, TransferMode};
use crate::error::GuardError;
use crate::trap_glue;

/// The one active guard, if any. Points into the stack frame of `run_scoped`.
static ACTIVE: AtomicPtr<Guard> = AtomicPtr::new(ptr::null_mut());
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_MARKER: u8 = const { 0 };
}

/// Distinct for every live thread. Readable from a signal handler.
fn thread_marker() -> usize {
    THREAD_MARKER.with(|marker| marker as *const u8 as usize)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GuardId(u64);

impl fmt::Display for GuardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Armed,
}

struct Guard {
    id: GuardId,
    owner: usize,
    transfer: TransferMode,
    context: SavedContext,
}

impl Guard {
    fn new(mode: CaptureMode, transfer: TransferMode) -> Self {
        Self {
            id: GuardId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            owner: thread_marker(),
            transfer: transfer.resolve(),
            context: SavedContext::new(mode),
        }
    }

    fn owned_by_current_thread(&self) -> bool {
        self.owner == thread_marker()
    }

    /// Sends `code` to this guard by its transfer mode. Must be called on the
    /// owning thread while the guard is active.
    fn transfer(&self, code: ResultCode) -> ! {
        if self.transfer == TransferMode::Resume {
            // Only fails on a dead context, which an active guard never has.
            let _ = unsafe { self.context.resume(code) };
        }
        panic::resume_unwind(Box::new(FailureTransfer {
            guard: self.id,
            code,
        }))
    }

    /// Maps a caught panic to a result code if it is this guard's sentinel.
    /// Any other payload keeps unwinding.
    fn accept(&self, payload: Box<dyn Any + Send>) -> ResultCode {
        match payload.downcast::<FailureTransfer>() {
            Ok(transfer) if transfer.guard == self.id => {
                log::debug!("guard {} caught failure {}", self.id, transfer.code);
                transfer.code
            }
            Ok(transfer) => panic::resume_unwind(transfer),
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

/// Unwind payload carrying a cooperative failure to the guard that owns it.
struct FailureTransfer {
    guard: GuardId,
    code: ResultCode,
}

/// Handle passed to the work of [`run_scoped`].
pub struct Scope<'g> {
    guard: &'g Guard,
}

impl Scope<'_> {
    pub fn id(&self) -> GuardId {
        self.guard.id
    }

    /// Abandons the work and makes the guard return `code`. Destructors of
    /// the abandoned frames run only under [`TransferMode::Unwind`].
    pub fn fail(&self, code: ResultCode) -> ! {
        self.guard.transfer(code)
    }
}

/// Holds the active slot for the lifetime of one guard.
struct ActiveSlot<'g> {
    guard: &'g Guard,
}

impl<'g> ActiveSlot<'g> {
    fn acquire(guard: &'g Guard) -> Result<Self, GuardError> {
        ACTIVE
            .compare_exchange(
                ptr::null_mut(),
                guard as *const Guard as *mut Guard,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| GuardError::AlreadyActive)?;
        Ok(Self { guard })
    }
}

impl Drop for ActiveSlot<'_> {
    fn drop(&mut self) {
        let _ = ACTIVE.compare_exchange(
            self.guard as *const Guard as *mut Guard,
            ptr::null_mut(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

/// Runs `work` under a fresh recovery point and returns its result code, or
/// the code of the first failure reported while it ran.
///
/// Fails with [`GuardError::AlreadyActive`] if any guard is already active,
/// including one further up this thread's stack. Panics that are not failure
/// transfers keep unwinding once the handlers are restored.
pub fn run_scoped<F>(work: F) -> Result<ResultCode, GuardError>
where
    F: FnOnce(&Scope<'_>) -> ResultCode,
{
    let config = config::current_config();
    let guard = Guard::new(config.capture, config.transfer);
    let slot = ActiveSlot::acquire(&guard).inspect_err(|_| {
        log::warn!("recovery point requested while one is active; rejected");
    })?;

    trap_glue::install(&config);
    let armed = signal::arm(&config.traps.resolve())?;
    log::trace!("guard {} armed with {:?}", guard.id, armed.plan());

    let scope = Scope { guard: &guard };
    let captured = guard
        .context
        .capture(|| panic::catch_unwind(AssertUnwindSafe(|| work(&scope))));

    armed.disarm();
    drop(slot);

    let code = match captured? {
        Capture::Completed(Ok(code)) => code,
        Capture::Completed(Err(payload)) => guard.accept(payload),
        Capture::Resumed(code) => {
            log::debug!("guard {} resumed with code {}", guard.id, code);
            code
        }
    };
    Ok(code)
}

/// [`run_scoped`] for work that does not need its [`Scope`].
pub fn run_guarded<F>(work: F) -> Result<ResultCode, GuardError>
where
    F: FnOnce() -> ResultCode,
{
    run_scoped(|_| work())
}

/// Routes a failure to the active recovery point.
///
/// Called from ordinary code it follows the guard's [`TransferMode`]: either
/// unwinding to the guard and running destructors on the way, or resuming
/// its saved context directly. Called from the overflow hook it always
/// resumes. With no active guard, or a guard owned by another thread, it is
/// a no-op and returns.
pub fn report_failure(code: ResultCode) {
    if trap_glue::take_in_trap() {
        transfer_by_resume(code);
        return;
    }

    let skipped = with_active(|guard| {
        if guard.owned_by_current_thread() {
            guard.transfer(code)
        }
    });
    match skipped {
        Some(()) => log::warn!("failure {} reported off the guard's thread; ignored", code),
        None => log::debug!("failure {} reported with no active guard; ignored", code),
    }
}

/// Resumes the active guard's context with `code`, skipping every frame in
/// between without running destructors. Async-signal-safe. Returns only when
/// there is nothing to resume into.
pub(crate) fn transfer_by_resume(code: ResultCode) {
    let active = ACTIVE.load(Ordering::Acquire);
    if active.is_null() {
        return;
    }
    let guard = unsafe { &*active };
    if !guard.owned_by_current_thread() {
        return;
    }
    debug::writeln!("[guard] resuming with code {}", code);
    let _ = unsafe { guard.context.resume(code) };
}

fn with_active<R>(f: impl FnOnce(&Guard) -> R) -> Option<R> {
    let active = ACTIVE.load(Ordering::Acquire);
    if active.is_null() {
        None
    } else {
        // The pointer is cleared before the guard's frame is left.
        Some(f(unsafe { &*active }))
    }
}

pub fn is_active() -> bool {
    !ACTIVE.load(Ordering::Acquire).is_null()
}

pub fn state() -> BridgeState {
    if is_active() {
        BridgeState::Armed
    } else {
        BridgeState::Idle
    }
}
