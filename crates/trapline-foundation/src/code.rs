/// Integer carried across a transfer. `0` is an ordinary success value; every
/// other value is either what the guarded work returned or a fault code.
pub type ResultCode = i32;

/// Reported for arithmetic-overflow traps unless configured otherwise.
pub const OVERFLOW_CODE: ResultCode = -1;

/// Returned through the C ABI when a guarded run could not start.
pub const RUN_REJECTED_CODE: ResultCode = i32::MIN;
