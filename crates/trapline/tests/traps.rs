#![cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]

mod common;

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};

use trapline::fault::raise_overflow_trap;
use trapline::{
    report_failure, run_guarded, CaptureMode, ConfigBuilder, Signal, TrapPlan, TrapSelection,
    OVERFLOW_CODE,
};

fn overflow_plan() -> TrapSelection {
    TrapSelection::Plan(TrapPlan::none().with_overflow(Signal::FPE))
}

fn handler_address(signo: libc::c_int) -> usize {
    unsafe {
        let mut current: libc::sigaction = std::mem::zeroed();
        libc::sigaction(signo, std::ptr::null(), &mut current);
        current.sa_sigaction
    }
}

#[test]
fn test_overflow_trap_becomes_result() {
    let _lock = common::serial();
    trapline::init(ConfigBuilder::default().traps(overflow_plan()).build().unwrap()).unwrap();

    let before = handler_address(libc::SIGFPE);
    let after = Cell::new(false);
    let result = run_guarded(|| {
        raise_overflow_trap();
        after.set(true);
        0
    });
    assert_eq!(result, Ok(OVERFLOW_CODE));
    assert!(!after.get());
    assert_eq!(handler_address(libc::SIGFPE), before);
}

#[test]
fn test_overflow_trap_caught_repeatedly() {
    let _lock = common::serial();
    trapline::init(ConfigBuilder::default().traps(overflow_plan()).build().unwrap()).unwrap();

    for _ in 0..2 {
        let result = run_guarded(|| {
            raise_overflow_trap();
            0
        });
        assert_eq!(result, Ok(OVERFLOW_CODE));
    }
    assert_eq!(run_guarded(|| 42), Ok(42));
}

#[test]
fn test_handlers_restored_after_cooperative_failure() {
    let _lock = common::serial();
    trapline::init(ConfigBuilder::default().traps(overflow_plan()).build().unwrap()).unwrap();

    let before = handler_address(libc::SIGFPE);
    let mut inside = 0;
    let result = run_guarded(|| {
        inside = handler_address(libc::SIGFPE);
        report_failure(7);
        0
    });
    assert_eq!(result, Ok(7));
    assert_ne!(inside, before);
    assert_eq!(handler_address(libc::SIGFPE), before);
}

#[test]
fn test_configured_overflow_code() {
    let _lock = common::serial();
    let config = ConfigBuilder::default()
        .traps(overflow_plan())
        .overflow_code(-40)
        .build()
        .unwrap();
    trapline::init(config).unwrap();

    assert_eq!(
        run_guarded(|| {
            raise_overflow_trap();
            0
        }),
        Ok(-40)
    );
}

static HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

extern "C" fn counting_hook() {
    HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    report_failure(-77);
}

#[test]
fn test_custom_overflow_hook() {
    let _lock = common::serial();
    let config = ConfigBuilder::default()
        .traps(overflow_plan())
        .overflow_hook(counting_hook as trapline::OverflowHook)
        .build()
        .unwrap();
    trapline::init(config).unwrap();

    let calls = HOOK_CALLS.load(Ordering::SeqCst);
    assert_eq!(
        run_guarded(|| {
            raise_overflow_trap();
            0
        }),
        Ok(-77)
    );
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), calls + 1);
}

fn block_usr2() {
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, libc::SIGUSR2);
        libc::pthread_sigmask(libc::SIG_BLOCK, &set, std::ptr::null_mut());
    }
}

fn unblock_usr2() {
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut set);
        libc::sigaddset(&mut set, libc::SIGUSR2);
        libc::pthread_sigmask(libc::SIG_UNBLOCK, &set, std::ptr::null_mut());
    }
}

fn usr2_blocked() -> bool {
    unsafe {
        let mut set: libc::sigset_t = std::mem::zeroed();
        libc::pthread_sigmask(libc::SIG_BLOCK, std::ptr::null(), &mut set);
        libc::sigismember(&set, libc::SIGUSR2) == 1
    }
}

fn overflow_after_blocking(capture: CaptureMode) -> (Result<i32, trapline::GuardError>, bool) {
    trapline::init(
        ConfigBuilder::default()
            .traps(overflow_plan())
            .capture(capture)
            .build()
            .unwrap(),
    )
    .unwrap();

    let mut blocked_inside = false;
    let result = run_guarded(|| {
        block_usr2();
        blocked_inside = usr2_blocked();
        raise_overflow_trap();
        0
    });
    (result, blocked_inside)
}

#[test]
fn test_overflow_restores_saved_signal_mask() {
    let _lock = common::serial();
    assert!(!usr2_blocked());

    let (result, blocked_inside) = overflow_after_blocking(CaptureMode::SaveSignalMask);
    assert_eq!(result, Ok(OVERFLOW_CODE));
    assert!(blocked_inside);
    assert!(!usr2_blocked());
}

#[test]
fn test_overflow_with_fast_capture_keeps_mask() {
    let _lock = common::serial();
    assert!(!usr2_blocked());

    let (result, blocked_inside) = overflow_after_blocking(CaptureMode::Fast);
    let still_blocked = usr2_blocked();
    unblock_usr2();
    assert_eq!(result, Ok(OVERFLOW_CODE));
    assert!(blocked_inside);
    assert!(still_blocked);
}

/// A page fault reports vector 14; a rule matching it turns the access fault
/// into an overflow.
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
#[test]
fn test_access_rule_classifies_by_trap_number() {
    use trapline::fault::touch_protected_page;
    use trapline::AccessRule;

    let _lock = common::serial();
    let plan = TrapPlan::none().with_access(Signal::SEGV, AccessRule::TrapNumber(14));
    trapline::init(
        ConfigBuilder::default()
            .traps(TrapSelection::Plan(plan))
            .build()
            .unwrap(),
    )
    .unwrap();

    let before = handler_address(libc::SIGSEGV);
    let result = run_guarded(|| {
        touch_protected_page().unwrap();
        0
    });
    assert_eq!(result, Ok(OVERFLOW_CODE));
    assert_eq!(handler_address(libc::SIGSEGV), before);
}
