use core::arch::naked_asm;

use super::Body;

/// AAPCS64 callee-saved state: x19..x28, fp, lr, sp and the low halves of
/// d8..d15.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Registers {
    x: [u64; 12],
    sp: u64,
    d: [u64; 8],
}

// The offsets below are spelled out in the assembly.
const _: () = assert!(core::mem::size_of::<Registers>() == 168);

impl foundation::RegisterFile for Registers {
    fn zeroed() -> Self {
        Self {
            x: [0; 12],
            sp: 0,
            d: [0; 8],
        }
    }

    fn sp(&self) -> usize {
        self.sp as usize
    }

    fn return_address(&self) -> usize {
        self.x[11] as usize
    }
}

/// Returns 0 once `body(arg)` returns, 1 when entered through [`resume_raw`].
///
/// # Safety
/// `regs` must stay valid for writes until the capture can no longer be resumed.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn capture_raw(regs: *mut Registers, body: Body, arg: *mut u8) -> u32 {
    naked_asm!(
        "stp x19, x20, [x0, #0]",
        "stp x21, x22, [x0, #16]",
        "stp x23, x24, [x0, #32]",
        "stp x25, x26, [x0, #48]",
        "stp x27, x28, [x0, #64]",
        "stp x29, x30, [x0, #80]",
        "mov x9, sp",
        "str x9, [x0, #96]",
        "stp d8, d9, [x0, #104]",
        "stp d10, d11, [x0, #120]",
        "stp d12, d13, [x0, #136]",
        "stp d14, d15, [x0, #152]",
        "stp x29, x30, [sp, #-16]!",
        "mov x29, sp",
        "mov x0, x2",
        "blr x1",
        "ldp x29, x30, [sp], #16",
        "mov w0, #0",
        "ret",
    );
}

/// # Safety
/// `regs` must hold a capture whose `capture_raw` call has not returned yet.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn resume_raw(regs: *const Registers) -> ! {
    naked_asm!(
        "ldp x19, x20, [x0, #0]",
        "ldp x21, x22, [x0, #16]",
        "ldp x23, x24, [x0, #32]",
        "ldp x25, x26, [x0, #48]",
        "ldp x27, x28, [x0, #64]",
        "ldp x29, x30, [x0, #80]",
        "ldr x9, [x0, #96]",
        "mov sp, x9",
        "ldp d8, d9, [x0, #104]",
        "ldp d10, d11, [x0, #120]",
        "ldp d12, d13, [x0, #136]",
        "ldp d14, d15, [x0, #152]",
        "mov w0, #1",
        "ret",
    );
}
