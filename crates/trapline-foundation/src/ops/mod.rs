mod trap;

pub use trap::TrapOps;
