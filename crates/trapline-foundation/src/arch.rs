/// Callee-saved register snapshot taken by a capture. The layout is private to
/// each architecture; callers only ever see it through this trait.
pub trait RegisterFile: Sized {
    fn zeroed() -> Self;

    fn sp(&self) -> usize;

    /// Address execution continues at when the snapshot is resumed.
    fn return_address(&self) -> usize;
}
