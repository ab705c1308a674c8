use core::cell::UnsafeCell;

/// Process-wide mutable slot.
///
/// trapline runs one logical thread of control through the bridge at a time;
/// these cells carry no lock so that signal handlers may read them. Callers
/// must not hand out overlapping `with_mut` borrows.
pub struct GlobalCell<T> {
    inner: UnsafeCell<T>,
}

unsafe impl<T: Send> Sync for GlobalCell<T> {}

impl<T> GlobalCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: UnsafeCell::new(value),
        }
    }

    #[inline(always)]
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(unsafe { &*self.inner.get() })
    }

    #[inline(always)]
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(unsafe { &mut *self.inner.get() })
    }

    #[inline]
    pub fn replace(&self, value: T) -> T {
        self.with_mut(|slot| core::mem::replace(slot, value))
    }
}

impl<T: Copy> GlobalCell<T> {
    #[inline(always)]
    pub fn get(&self) -> T {
        self.with(|v| *v)
    }
}

pub struct GlobalOption<T> {
    cell: GlobalCell<Option<T>>,
}

impl<T> GlobalOption<T> {
    pub const fn none() -> Self {
        Self {
            cell: GlobalCell::new(None),
        }
    }

    #[inline]
    pub fn set(&self, value: T) {
        self.cell.replace(Some(value));
    }

    #[inline]
    pub fn take(&self) -> Option<T> {
        self.cell.replace(None)
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        self.cell.with(|v| v.is_some())
    }

    #[inline(always)]
    pub fn with_some<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.cell.with(|v| v.as_ref().map(f))
    }
}
