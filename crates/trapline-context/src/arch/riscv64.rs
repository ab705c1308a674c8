use core::arch::naked_asm;

use super::Body;

/// LP64D callee-saved state: ra, sp, s0..s11 and fs0..fs11.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Registers {
    ra: u64,
    sp: u64,
    s: [u64; 12],
    fs: [u64; 12],
}

const _: () = assert!(core::mem::size_of::<Registers>() == 208);

impl foundation::RegisterFile for Registers {
    fn zeroed() -> Self {
        Self {
            ra: 0,
            sp: 0,
            s: [0; 12],
            fs: [0; 12],
        }
    }

    fn sp(&self) -> usize {
        self.sp as usize
    }

    fn return_address(&self) -> usize {
        self.ra as usize
    }
}

/// Returns 0 once `body(arg)` returns, 1 when entered through [`resume_raw`].
///
/// # Safety
/// `regs` must stay valid for writes until the capture can no longer be resumed.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn capture_raw(regs: *mut Registers, body: Body, arg: *mut u8) -> u32 {
    naked_asm!(
        "sd ra, 0(a0)",
        "sd sp, 8(a0)",
        "sd s0, 16(a0)",
        "sd s1, 24(a0)",
        "sd s2, 32(a0)",
        "sd s3, 40(a0)",
        "sd s4, 48(a0)",
        "sd s5, 56(a0)",
        "sd s6, 64(a0)",
        "sd s7, 72(a0)",
        "sd s8, 80(a0)",
        "sd s9, 88(a0)",
        "sd s10, 96(a0)",
        "sd s11, 104(a0)",
        "fsd fs0, 112(a0)",
        "fsd fs1, 120(a0)",
        "fsd fs2, 128(a0)",
        "fsd fs3, 136(a0)",
        "fsd fs4, 144(a0)",
        "fsd fs5, 152(a0)",
        "fsd fs6, 160(a0)",
        "fsd fs7, 168(a0)",
        "fsd fs8, 176(a0)",
        "fsd fs9, 184(a0)",
        "fsd fs10, 192(a0)",
        "fsd fs11, 200(a0)",
        "addi sp, sp, -16",
        "sd ra, 8(sp)",
        "mv t0, a1",
        "mv a0, a2",
        "jalr t0",
        "ld ra, 8(sp)",
        "addi sp, sp, 16",
        "li a0, 0",
        "ret",
    );
}

/// # Safety
/// `regs` must hold a capture whose `capture_raw` call has not returned yet.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn resume_raw(regs: *const Registers) -> ! {
    naked_asm!(
        "ld ra, 0(a0)",
        "ld sp, 8(a0)",
        "ld s0, 16(a0)",
        "ld s1, 24(a0)",
        "ld s2, 32(a0)",
        "ld s3, 40(a0)",
        "ld s4, 48(a0)",
        "ld s5, 56(a0)",
        "ld s6, 64(a0)",
        "ld s7, 72(a0)",
        "ld s8, 80(a0)",
        "ld s9, 88(a0)",
        "ld s10, 96(a0)",
        "ld s11, 104(a0)",
        "fld fs0, 112(a0)",
        "fld fs1, 120(a0)",
        "fld fs2, 128(a0)",
        "fld fs3, 136(a0)",
        "fld fs4, 144(a0)",
        "fld fs5, 152(a0)",
        "fld fs6, 160(a0)",
        "fld fs7, 168(a0)",
        "fld fs8, 176(a0)",
        "fld fs9, 184(a0)",
        "fld fs10, 192(a0)",
        "fld fs11, 200(a0)",
        "li a0, 1",
        "ret",
    );
}
