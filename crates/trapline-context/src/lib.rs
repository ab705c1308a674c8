//! Saved execution contexts.
//!
//! A [`SavedContext`] records "where to resume": the callee-saved registers,
//! stack pointer and return address of the frame that called
//! [`SavedContext::capture`]. While the capture body is running, any code on
//! the same thread, signal handlers included, may call
//! [`SavedContext::resume`] to abandon every frame above the capture and make
//! `capture` return [`Capture::Resumed`] with a result code.
//!
//! Abandoned frames are not unwound: their destructors never run and whatever
//! they own is leaked. Resuming is meant for faults that leave nothing worth
//! cleaning up; cooperative failures should unwind instead.

mod arch;
mod mask;

use core::cell::UnsafeCell;
use core::convert::Infallible;
use core::fmt;
use core::mem;
use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use foundation::{RegisterFile, ResultCode};

pub use arch::{Registers, SUPPORTED};
pub use mask::SignalMask;

/// Whether a capture also records the signal mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureMode {
    /// Registers only. Signals blocked at resume time stay blocked.
    #[default]
    Fast,
    /// Saves the thread signal mask at capture and reinstalls it on resume.
    SaveSignalMask,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capture<R> {
    /// The body returned normally.
    Completed(R),
    /// Control came back through [`SavedContext::resume`].
    Resumed(ResultCode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextError {
    /// A capture on this context is already in progress.
    Busy,
    /// No capture is in progress, so there is nothing to resume into.
    Stale,
    /// This architecture has no capture primitive.
    Unsupported,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Busy => write!(f, "context capture already in progress"),
            ContextError::Stale => write!(f, "context is not live"),
            ContextError::Unsupported => write!(f, "context capture unsupported on this architecture"),
        }
    }
}

impl std::error::Error for ContextError {}

enum Call<F, R> {
    Pending(F),
    Done(R),
    Abandoned,
}

extern "C" fn trampoline<F, R>(arg: *mut u8)
where
    F: FnOnce() -> R,
{
    let call = unsafe { &mut *arg.cast::<Call<F, R>>() };
    if let Call::Pending(body) = mem::replace(call, Call::Abandoned) {
        *call = Call::Done(body());
    }
}

pub struct SavedContext {
    regs: UnsafeCell<Registers>,
    code: AtomicI32,
    live: AtomicBool,
    mode: CaptureMode,
    mask: UnsafeCell<Option<SignalMask>>,
}

impl SavedContext {
    pub fn new(mode: CaptureMode) -> Self {
        Self {
            regs: UnsafeCell::new(Registers::zeroed()),
            code: AtomicI32::new(0),
            live: AtomicBool::new(false),
            mode,
            mask: UnsafeCell::new(None),
        }
    }

    /// True while a `capture` on this context has not returned.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Copy of the last captured register file.
    pub fn registers(&self) -> Registers {
        unsafe { *self.regs.get() }
    }

    /// Captures the current frame and runs `body` on top of it.
    ///
    /// `body` must not unwind: it runs behind an `extern "C"` boundary, so a
    /// panic escaping it aborts the process. Wrap it in `catch_unwind` when it
    /// can panic.
    pub fn capture<R, F>(&self, body: F) -> Result<Capture<R>, ContextError>
    where
        F: FnOnce() -> R,
    {
        if self.live.swap(true, Ordering::AcqRel) {
            return Err(ContextError::Busy);
        }
        if self.mode == CaptureMode::SaveSignalMask {
            unsafe { *self.mask.get() = Some(SignalMask::current()) };
        }

        let mut call: Call<F, R> = Call::Pending(body);
        let resumed = unsafe {
            arch::capture_raw(
                self.regs.get(),
                trampoline::<F, R>,
                (&mut call as *mut Call<F, R>).cast(),
            )
        };
        self.live.store(false, Ordering::Release);

        let mask = unsafe { (*self.mask.get()).take() };
        if resumed != 0 {
            if let Some(mask) = mask {
                mask.restore();
            }
            return Ok(Capture::Resumed(self.code.load(Ordering::Acquire)));
        }

        match call {
            Call::Done(value) => Ok(Capture::Completed(value)),
            Call::Pending(_) | Call::Abandoned => unreachable!("capture body neither returned nor resumed"),
        }
    }

    /// Transfers control back into the running capture, which then returns
    /// `Capture::Resumed(code)`. Returns only on error.
    ///
    /// Async-signal-safe: touches nothing but the saved registers and `code`.
    ///
    /// # Safety
    /// Must be called on the thread that is running the capture body. Every
    /// frame between here and the capture is abandoned without running its
    /// destructors.
    pub unsafe fn resume(&self, code: ResultCode) -> Result<Infallible, ContextError> {
        if !SUPPORTED {
            return Err(ContextError::Unsupported);
        }
        if !self.is_live() {
            return Err(ContextError::Stale);
        }
        self.code.store(code, Ordering::Release);
        unsafe { arch::resume_raw(self.regs.get()) }
    }
}

impl fmt::Debug for SavedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedContext")
            .field("mode", &self.mode)
            .field("live", &self.is_live())
            .finish()
    }
}
