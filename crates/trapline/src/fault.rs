//! Deliberate faults, for exercising the bridge end to end.

use cfg_if::cfg_if;

/// Makes the CPU raise this platform's arithmetic-overflow trap.
///
/// On x86_64 this is a real `idiv` overflow and on 32-bit x86 an `into` with
/// the overflow flag set. Elsewhere the trap signal is raised directly.
pub fn raise_overflow_trap() {
    cfg_if! {
        if #[cfg(all(unix, target_arch = "x86_64"))] {
            // i32::MIN / -1 does not fit and raises #DE.
            unsafe {
                core::arch::asm!(
                    "cdq",
                    "idiv {divisor:e}",
                    divisor = in(reg) -1i32,
                    inout("eax") i32::MIN => _,
                    out("edx") _,
                    options(nostack),
                );
            }
        } else if #[cfg(all(unix, target_arch = "x86"))] {
            unsafe {
                core::arch::asm!(
                    "mov {t}, 0x7fffffff",
                    "add {t}, 1",
                    "into",
                    t = out(reg) _,
                    options(nostack),
                );
            }
        } else if #[cfg(unix)] {
            unsafe { libc::raise(libc::SIGFPE) };
        }
    }
}

/// Writes to a page mapped with no access. Never an overflow, so under any
/// default plan the process dies.
#[cfg(unix)]
pub fn touch_protected_page() -> std::io::Result<()> {
    use std::ptr;

    let len = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    let page = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_NONE,
            libc::MAP_PRIVATE | libc::MAP_ANON,
            -1,
            0,
        )
    };
    if page == libc::MAP_FAILED {
        return Err(std::io::Error::last_os_error());
    }
    unsafe {
        ptr::write_volatile(page.cast::<u8>(), 1);
        libc::munmap(page, len);
    }
    Ok(())
}
