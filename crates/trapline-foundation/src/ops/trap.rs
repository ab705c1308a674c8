/// Entry points a trap handler may call. Every function here runs inside a
/// signal handler: no allocation, no locks.
#[derive(Clone, Copy)]
pub struct TrapOps {
    /// An arithmetic-overflow trap was recognised. Returns only when nothing
    /// took the transfer.
    pub overflow: fn(),
}
