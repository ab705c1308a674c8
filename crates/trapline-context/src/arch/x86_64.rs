use core::arch::naked_asm;
use core::mem::offset_of;

use super::Body;

/// System V callee-saved registers plus the caller's stack pointer and
/// return address.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Registers {
    rbx: u64,
    rbp: u64,
    r12: u64,
    r13: u64,
    r14: u64,
    r15: u64,
    rsp: u64,
    rip: u64,
}

impl foundation::RegisterFile for Registers {
    fn zeroed() -> Self {
        Self {
            rbx: 0,
            rbp: 0,
            r12: 0,
            r13: 0,
            r14: 0,
            r15: 0,
            rsp: 0,
            rip: 0,
        }
    }

    fn sp(&self) -> usize {
        self.rsp as usize
    }

    fn return_address(&self) -> usize {
        self.rip as usize
    }
}

/// Returns 0 once `body(arg)` returns, 1 when entered through [`resume_raw`].
///
/// # Safety
/// `regs` must stay valid for writes until the capture can no longer be resumed.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn capture_raw(regs: *mut Registers, body: Body, arg: *mut u8) -> u32 {
    naked_asm!(
        "mov [rdi + {off_rbx}], rbx",
        "mov [rdi + {off_rbp}], rbp",
        "mov [rdi + {off_r12}], r12",
        "mov [rdi + {off_r13}], r13",
        "mov [rdi + {off_r14}], r14",
        "mov [rdi + {off_r15}], r15",
        // Stack pointer as it will be after our own `ret`.
        "lea rax, [rsp + 8]",
        "mov [rdi + {off_rsp}], rax",
        "mov rax, [rsp]",
        "mov [rdi + {off_rip}], rax",
        // Entry rsp is 8 mod 16; one push realigns for the call.
        "push rbp",
        "mov rdi, rdx",
        "call rsi",
        "pop rbp",
        "xor eax, eax",
        "ret",
        off_rbx = const offset_of!(Registers, rbx),
        off_rbp = const offset_of!(Registers, rbp),
        off_r12 = const offset_of!(Registers, r12),
        off_r13 = const offset_of!(Registers, r13),
        off_r14 = const offset_of!(Registers, r14),
        off_r15 = const offset_of!(Registers, r15),
        off_rsp = const offset_of!(Registers, rsp),
        off_rip = const offset_of!(Registers, rip),
    );
}

/// # Safety
/// `regs` must hold a capture whose `capture_raw` call has not returned yet.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn resume_raw(regs: *const Registers) -> ! {
    naked_asm!(
        "mov rbx, [rdi + {off_rbx}]",
        "mov rbp, [rdi + {off_rbp}]",
        "mov r12, [rdi + {off_r12}]",
        "mov r13, [rdi + {off_r13}]",
        "mov r14, [rdi + {off_r14}]",
        "mov r15, [rdi + {off_r15}]",
        "mov rsp, [rdi + {off_rsp}]",
        "mov eax, 1",
        "jmp qword ptr [rdi + {off_rip}]",
        off_rbx = const offset_of!(Registers, rbx),
        off_rbp = const offset_of!(Registers, rbp),
        off_r12 = const offset_of!(Registers, r12),
        off_r13 = const offset_of!(Registers, r13),
        off_r14 = const offset_of!(Registers, r14),
        off_r15 = const offset_of!(Registers, r15),
        off_rsp = const offset_of!(Registers, rsp),
        off_rip = const offset_of!(Registers, rip),
    );
}
