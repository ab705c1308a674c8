pub mod global;

pub use global::{GlobalCell, GlobalOption};
