use std::process::{Command, Output};

fn probe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trapline-probe"))
        .args(args)
        .env_remove("TRAPLINE_CAPTURE")
        .env_remove("TRAPLINE_TRAPS")
        .output()
        .expect("failed to spawn trapline-probe")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_ok_scenario() {
    let output = probe(&["ok"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "result: 42\n");
}

#[test]
fn test_report_scenario() {
    let output = probe(&["report", "-5"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "result: -5\n");
}

#[test]
fn test_deep_scenario_skips_frames() {
    let output = probe(&["deep"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "result: 7\nframes returned: 0\n");
}

#[test]
fn test_nested_scenario() {
    let output = probe(&["nested"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "nested: rejected\nresult: 2\n");
}

#[cfg(any(
    target_os = "macos",
    all(target_os = "linux", target_arch = "x86_64")
))]
mod overflow {
    use super::*;

    #[test]
    fn test_overflow_caught_twice() {
        let output = probe(&["overflow", "--repeat", "2"]);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "result: -1\nresult: -1\n");
    }

    #[test]
    fn test_overflow_code_flag() {
        let output = probe(&["--overflow-code", "-30", "overflow"]);
        assert!(output.status.success());
        assert_eq!(stdout(&output), "result: -30\n");
    }

    #[test]
    fn test_overflow_with_saved_mask_from_env() {
        let output = Command::new(env!("CARGO_BIN_EXE_trapline-probe"))
            .arg("overflow")
            .env("TRAPLINE_CAPTURE", "save-mask")
            .output()
            .expect("failed to spawn trapline-probe");
        assert!(output.status.success());
        assert_eq!(stdout(&output), "result: -1\n");
    }
}

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
#[test]
fn test_deep_scenario_with_resume_transfer() {
    let output = probe(&["--transfer", "resume", "deep"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "result: 7\nframes returned: 0\n");
}

#[cfg(all(unix, any(target_arch = "x86_64", target_arch = "aarch64")))]
#[test]
fn test_report_scenario_with_resume_transfer() {
    let output = probe(&["--transfer", "resume", "report", "5"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "result: 5\n");
}

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
#[test]
fn test_access_fault_classified_as_overflow() {
    let output = probe(&["--access-vector", "14", "access-fault"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "result: -1\n");
}
