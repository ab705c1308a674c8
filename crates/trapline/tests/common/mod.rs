use std::sync::{Mutex, MutexGuard};

static SERIAL: Mutex<()> = Mutex::new(());

/// Guards and signal handlers are process-wide; tests touching them take
/// this lock and start from an unconfigured bridge.
pub fn serial() -> MutexGuard<'static, ()> {
    let lock = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    trapline::teardown().unwrap();
    lock
}
