use std::cell::Cell;

use anyhow::Context;
use clap::Subcommand;
use trapline::fault;
use trapline::{report_failure, run_guarded, GuardError, ResultCode};

#[derive(Debug, Subcommand)]
pub enum Scenario {
    /// Work returns normally
    Ok {
        #[arg(default_value_t = 42, allow_negative_numbers = true)]
        value: ResultCode,
    },
    /// Work reports a failure directly
    Report {
        #[arg(allow_negative_numbers = true)]
        code: ResultCode,
    },
    /// Work reports a failure from the bottom of a deep call chain
    Deep {
        #[arg(long, default_value_t = 50)]
        depth: u32,
        #[arg(long, default_value_t = 7, allow_negative_numbers = true)]
        code: ResultCode,
    },
    /// Work raises an arithmetic-overflow trap
    Overflow {
        /// Number of guarded runs, each raising one trap
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Work writes to a protected page; the process is expected to die
    AccessFault,
    /// Work tries to open a second recovery point
    Nested,
}

impl Scenario {
    /// Runs the scenario and returns the lines to print.
    pub fn run(&self) -> anyhow::Result<Vec<String>> {
        match *self {
            Scenario::Ok { value } => Ok(vec![result_line(run_guarded(|| value)?)]),
            Scenario::Report { code } => {
                let code = run_guarded(|| {
                    report_failure(code);
                    0
                })?;
                Ok(vec![result_line(code)])
            }
            Scenario::Deep { depth, code } => {
                let returned = Cell::new(0u32);
                let result = run_guarded(|| descend(depth, code, &returned))?;
                Ok(vec![
                    result_line(result),
                    format!("frames returned: {}", returned.get()),
                ])
            }
            Scenario::Overflow { repeat } => (0..repeat)
                .map(|_| -> anyhow::Result<String> {
                    let code = run_guarded(|| {
                        fault::raise_overflow_trap();
                        0
                    })?;
                    Ok(result_line(code))
                })
                .collect(),
            Scenario::AccessFault => {
                let mut outcome = Ok(());
                let code = run_guarded(|| {
                    outcome = touch();
                    0
                })?;
                outcome.context("mapping protected page")?;
                Ok(vec![result_line(code)])
            }
            Scenario::Nested => {
                let mut inner = None;
                let outer = run_guarded(|| {
                    inner = Some(run_guarded(|| 1));
                    2
                })?;
                let nested = match inner {
                    Some(Err(GuardError::AlreadyActive)) => "rejected".to_string(),
                    Some(Ok(code)) => format!("accepted {}", code),
                    Some(Err(err)) => format!("failed: {}", err),
                    None => "not attempted".to_string(),
                };
                Ok(vec![format!("nested: {}", nested), result_line(outer)])
            }
        }
    }
}

fn result_line(code: ResultCode) -> String {
    format!("result: {}", code)
}

fn descend(depth: u32, code: ResultCode, returned: &Cell<u32>) -> ResultCode {
    if depth == 0 {
        report_failure(code);
    } else {
        descend(depth - 1, code, returned);
    }
    returned.set(returned.get() + 1);
    0
}

#[cfg(unix)]
fn touch() -> std::io::Result<()> {
    fault::touch_protected_page()
}

#[cfg(not(unix))]
fn touch() -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "no protected pages on this platform",
    ))
}
