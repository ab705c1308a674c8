mod common;

use std::cell::Cell;
use std::panic;

use trapline::{
    is_active, report_failure, run_guarded, run_scoped, state, BridgeState, Config,
    ConfigBuilder, GuardError, TrapSelection,
};

fn no_traps() -> Config {
    ConfigBuilder::default()
        .traps(TrapSelection::Disabled)
        .build()
        .unwrap()
}

#[test]
fn test_normal_return() {
    let _lock = common::serial();
    assert_eq!(run_guarded(|| 42), Ok(42));
    assert_eq!(state(), BridgeState::Idle);
}

#[test]
fn test_report_skips_rest_of_work() {
    let _lock = common::serial();
    let after = Cell::new(false);
    let result = run_guarded(|| {
        report_failure(3);
        after.set(true);
        0
    });
    assert_eq!(result, Ok(3));
    assert!(!after.get());
}

fn recurse(depth: u32, code: i32, returned: &Cell<u32>) -> i32 {
    if depth == 0 {
        report_failure(code);
    } else {
        recurse(depth - 1, code, returned);
    }
    returned.set(returned.get() + 1);
    0
}

#[test]
fn test_report_from_deep_recursion() {
    let _lock = common::serial();
    let returned = Cell::new(0);
    assert_eq!(run_guarded(|| recurse(50, 7, &returned)), Ok(7));
    assert_eq!(returned.get(), 0);
}

#[test]
fn test_report_zero_is_transferred() {
    let _lock = common::serial();
    assert_eq!(
        run_guarded(|| {
            report_failure(0);
            5
        }),
        Ok(0)
    );
}

#[test]
fn test_report_without_guard_returns() {
    let _lock = common::serial();
    report_failure(9);
    assert!(!is_active());
    assert_eq!(run_guarded(|| 1), Ok(1));
}

#[test]
fn test_state_tracks_guard() {
    let _lock = common::serial();
    assert_eq!(state(), BridgeState::Idle);
    let inside = run_guarded(|| match state() {
        BridgeState::Armed => 1,
        BridgeState::Idle => 0,
    });
    assert_eq!(inside, Ok(1));
    assert_eq!(state(), BridgeState::Idle);
}

#[test]
fn test_nested_guard_rejected() {
    let _lock = common::serial();
    let mut nested = None;
    let outer = run_guarded(|| {
        nested = Some(run_guarded(|| 1));
        2
    });
    assert_eq!(outer, Ok(2));
    assert_eq!(nested, Some(Err(GuardError::AlreadyActive)));
}

#[test]
fn test_guard_usable_after_failure() {
    let _lock = common::serial();
    for code in [4, 5, 6] {
        assert_eq!(
            run_guarded(|| {
                report_failure(code);
                0
            }),
            Ok(code)
        );
    }
    assert_eq!(run_guarded(|| 8), Ok(8));
}

struct Flag<'a>(&'a Cell<bool>);

impl Drop for Flag<'_> {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

#[test]
fn test_cooperative_failure_runs_destructors() {
    let _lock = common::serial();
    let dropped = Cell::new(false);
    let result = run_guarded(|| {
        let _flag = Flag(&dropped);
        report_failure(12);
        0
    });
    assert_eq!(result, Ok(12));
    assert!(dropped.get());
}

#[test]
fn test_foreign_panic_propagates() {
    let _lock = common::serial();
    let caught = panic::catch_unwind(|| run_guarded(|| panic!("not a failure")));
    let payload = caught.unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"not a failure"));
    assert!(!is_active());
    assert_eq!(run_guarded(|| 3), Ok(3));
}

#[test]
fn test_scope_fail() {
    let _lock = common::serial();
    let dropped = Cell::new(false);
    let result = run_scoped(|scope| {
        let _flag = Flag(&dropped);
        scope.fail(21)
    });
    assert_eq!(result, Ok(21));
    assert!(dropped.get());
}

#[test]
fn test_scope_ids_are_unique() {
    let _lock = common::serial();
    let mut ids = Vec::new();
    for _ in 0..3 {
        run_scoped(|scope| {
            ids.push(scope.id());
            0
        })
        .unwrap();
    }
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_report_from_other_thread_is_ignored() {
    let _lock = common::serial();
    let result = run_guarded(|| {
        std::thread::spawn(|| report_failure(13)).join().unwrap();
        1
    });
    assert_eq!(result, Ok(1));
}

#[test]
fn test_guard_from_other_thread_is_rejected_while_active() {
    let _lock = common::serial();
    let result = run_guarded(|| {
        let other = std::thread::spawn(|| run_guarded(|| 1)).join().unwrap();
        assert_eq!(other, Err(GuardError::AlreadyActive));
        2
    });
    assert_eq!(result, Ok(2));
}

#[test]
fn test_config_locked_while_active() {
    let _lock = common::serial();
    trapline::init(no_traps()).unwrap();
    let mut during = None;
    run_guarded(|| {
        during = Some((trapline::init(Config::default()), trapline::teardown()));
        0
    })
    .unwrap();
    assert_eq!(
        during,
        Some((Err(GuardError::AlreadyActive), Err(GuardError::AlreadyActive)))
    );
    assert_eq!(trapline::current_config(), no_traps());
    trapline::teardown().unwrap();
    assert_eq!(trapline::current_config(), Config::default());
}

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
mod resume_transfer {
    use super::*;
    use trapline::TransferMode;

    fn resume_config() -> Config {
        ConfigBuilder::default()
            .traps(TrapSelection::Disabled)
            .transfer(TransferMode::Resume)
            .build()
            .unwrap()
    }

    extern "C" fn failing_callback() {
        report_failure(3);
    }

    #[test]
    fn test_report_crosses_extern_c_frame() {
        let _lock = common::serial();
        trapline::init(resume_config()).unwrap();

        let after = Cell::new(false);
        let result = run_guarded(|| {
            failing_callback();
            after.set(true);
            0
        });
        assert_eq!(result, Ok(3));
        assert!(!after.get());
        assert!(!is_active());
    }

    #[test]
    fn test_report_from_deep_recursion() {
        let _lock = common::serial();
        trapline::init(resume_config()).unwrap();

        let returned = Cell::new(0);
        assert_eq!(run_guarded(|| recurse(50, 7, &returned)), Ok(7));
        assert_eq!(returned.get(), 0);
    }

    #[test]
    fn test_resume_skips_destructors() {
        let _lock = common::serial();
        trapline::init(resume_config()).unwrap();

        let dropped = Cell::new(false);
        let result = run_guarded(|| {
            let _flag = Flag(&dropped);
            report_failure(12);
            0
        });
        assert_eq!(result, Ok(12));
        assert!(!dropped.get());
    }

    #[test]
    fn test_scope_fail_resumes() {
        let _lock = common::serial();
        trapline::init(resume_config()).unwrap();

        assert_eq!(run_scoped(|scope| scope.fail(21)), Ok(21));
        assert_eq!(run_guarded(|| 4), Ok(4));
    }

    #[test]
    fn test_report_without_guard_returns() {
        let _lock = common::serial();
        trapline::init(resume_config()).unwrap();

        report_failure(9);
        assert_eq!(
            run_guarded(|| {
                report_failure(0);
                5
            }),
            Ok(0)
        );
    }
}
