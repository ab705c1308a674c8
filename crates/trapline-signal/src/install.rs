use core::ffi::c_void;
use core::marker::PhantomData;
use core::{mem, ptr};

use foundation::kfn;
use foundation::utils::GlobalCell;
use libc::{c_int, siginfo_t};

use crate::error::SignalError;
use crate::machine;
use crate::plan::{AccessRule, FaultMeta, Signal, TrapPlan};

type Handler = unsafe extern "C" fn(c_int, *mut siginfo_t, *mut c_void);

#[derive(Clone, Copy)]
struct Installed {
    signal: Signal,
    previous: libc::sigaction,
}

/// Handlers displaced by the current arm cycle, restored on disarm.
#[derive(Clone, Copy)]
struct InstalledHandlerSet {
    overflow: Option<Installed>,
    access: Option<Installed>,
    access_rule: Option<AccessRule>,
}

impl InstalledHandlerSet {
    const EMPTY: Self = Self {
        overflow: None,
        access: None,
        access_rule: None,
    };

    fn is_armed(&self) -> bool {
        self.overflow.is_some() || self.access.is_some()
    }

    fn find(&self, signo: c_int) -> Option<Installed> {
        [self.overflow, self.access]
            .into_iter()
            .flatten()
            .find(|installed| installed.signal.raw() == signo)
    }
}

static INSTALLED: GlobalCell<InstalledHandlerSet> = GlobalCell::new(InstalledHandlerSet::EMPTY);

/// Handlers installed for one arm cycle. Dropping it restores the previous
/// handlers.
pub struct ArmedTraps {
    plan: TrapPlan,
    _not_send: PhantomData<*mut ()>,
}

impl ArmedTraps {
    pub fn plan(&self) -> &TrapPlan {
        &self.plan
    }

    pub fn disarm(self) {}
}

impl Drop for ArmedTraps {
    fn drop(&mut self) {
        if disarm_all() {
            log::trace!("trap handlers disarmed: {:?}", self.plan);
        }
    }
}

pub fn is_armed() -> bool {
    INSTALLED.with(|set| set.is_armed())
}

/// Installs the handlers `plan` asks for, remembering what they displace.
pub fn arm(plan: &TrapPlan) -> Result<ArmedTraps, SignalError> {
    if is_armed() {
        return Err(SignalError::AlreadyArmed);
    }

    if let Some(signal) = plan.overflow {
        let previous = install(signal, overflow_handler, 0)?;
        INSTALLED.with_mut(|set| set.overflow = Some(Installed { signal, previous }));
    }

    if let Some(access) = plan.access {
        INSTALLED.with_mut(|set| set.access_rule = Some(access.rule));
        // One-shot: a second delivery goes to the default action.
        match install(access.signal, access_handler, libc::SA_RESETHAND) {
            Ok(previous) => INSTALLED.with_mut(|set| {
                set.access = Some(Installed {
                    signal: access.signal,
                    previous,
                })
            }),
            Err(err) => {
                disarm_all();
                return Err(err);
            }
        }
    }

    if !plan.is_empty() {
        log::trace!(
            "trap handlers armed for {:?}",
            plan.signals().collect::<Vec<_>>()
        );
    }
    Ok(ArmedTraps {
        plan: *plan,
        _not_send: PhantomData,
    })
}

/// Address of the handler currently installed for `signal`.
pub fn handler_address(signal: Signal) -> Result<usize, SignalError> {
    let mut current: libc::sigaction = unsafe { mem::zeroed() };
    if unsafe { libc::sigaction(signal.raw(), ptr::null(), &mut current) } != 0 {
        return Err(SignalError::Install {
            signal,
            errno: last_errno(),
        });
    }
    Ok(current.sa_sigaction)
}

fn install(signal: Signal, handler: Handler, extra_flags: c_int) -> Result<libc::sigaction, SignalError> {
    unsafe {
        let mut action: libc::sigaction = mem::zeroed();
        action.sa_sigaction = handler as libc::sighandler_t;
        // NODEFER keeps the signal mask untouched when a handler never returns.
        action.sa_flags = libc::SA_SIGINFO | libc::SA_ONSTACK | libc::SA_NODEFER | extra_flags;
        libc::sigemptyset(&mut action.sa_mask);

        let mut previous: libc::sigaction = mem::zeroed();
        if libc::sigaction(signal.raw(), &action, &mut previous) != 0 {
            return Err(SignalError::Install {
                signal,
                errno: last_errno(),
            });
        }
        Ok(previous)
    }
}

fn restore(installed: &Installed) {
    unsafe { libc::sigaction(installed.signal.raw(), &installed.previous, ptr::null_mut()) };
}

/// Returns whether anything was installed.
fn disarm_all() -> bool {
    let set = INSTALLED.replace(InstalledHandlerSet::EMPTY);
    if let Some(installed) = set.access {
        restore(&installed);
    }
    if let Some(installed) = set.overflow {
        restore(&installed);
    }
    set.is_armed()
}

/// Hands `signo` back to the handler that was there before us. The caller
/// returns afterwards, so a hardware fault re-executes under that handler.
fn restore_previous(signo: c_int) {
    if let Some(installed) = INSTALLED.with(|set| set.find(signo)) {
        restore(&installed);
    }
}

fn last_errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

unsafe extern "C" fn overflow_handler(signo: c_int, _info: *mut siginfo_t, _uctx: *mut c_void) {
    debug::writeln!("[trap] overflow on signal {}", signo);
    kfn::trap::overflow();

    debug::writeln!("[trap] overflow on signal {} not taken", signo);
    restore_previous(signo);
}

unsafe extern "C" fn access_handler(signo: c_int, _info: *mut siginfo_t, uctx: *mut c_void) {
    let meta = FaultMeta {
        signal: Signal(signo),
        trap_number: unsafe { machine::trap_number(uctx) },
    };
    let rule = INSTALLED.with(|set| set.access_rule);
    if rule.is_some_and(|rule| rule.is_disguised_overflow(&meta)) {
        debug::writeln!("[trap] access fault is overflow: {:?}", meta.trap_number);
        kfn::trap::overflow();
    }

    // We lose.
    debug::writeln!("[trap] unclassified fault on signal {}", signo);
    restore_previous(signo);
}
