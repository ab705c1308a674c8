use super::Body;

/// Placeholder on architectures without a capture primitive. Captures run
/// their body directly and can never be resumed.
#[derive(Clone, Copy, Debug)]
pub struct Registers;

impl foundation::RegisterFile for Registers {
    fn zeroed() -> Self {
        Self
    }

    fn sp(&self) -> usize {
        0
    }

    fn return_address(&self) -> usize {
        0
    }
}

pub(crate) unsafe extern "C" fn capture_raw(_regs: *mut Registers, body: Body, arg: *mut u8) -> u32 {
    body(arg);
    0
}

pub(crate) unsafe extern "C" fn resume_raw(_regs: *const Registers) -> ! {
    unsafe { libc::abort() }
}
