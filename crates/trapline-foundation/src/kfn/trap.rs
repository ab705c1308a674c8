use crate::ops::TrapOps;
use crate::utils::GlobalOption;

static TRAP_OPS: GlobalOption<TrapOps> = GlobalOption::none();

#[inline]
pub fn register(ops: TrapOps) {
    TRAP_OPS.set(ops);
}

#[inline]
pub fn unregister() {
    TRAP_OPS.take();
}

/// Forwards an overflow trap to whoever registered the ops table.
#[inline]
pub fn overflow() {
    match TRAP_OPS.with_some(|ops| ops.overflow) {
        Some(overflow) => overflow(),
        None => debug::writeln!("[trap] overflow with no ops registered"),
    }
}
