//! Debug output that is safe to emit from a signal handler.
//!
//! Lines are formatted into a fixed stack buffer and written to stderr with a
//! raw `write(2)`; nothing allocates or takes a lock. Output is compiled in only
//! with the `debug` feature, otherwise `writeln!` type-checks its arguments and
//! does nothing.

#![no_std]

use core::fmt::{self, Write};

pub const LINE_CAPACITY: usize = 256;

/// Fixed-size line buffer. Text past the capacity is dropped.
pub struct LineBuffer {
    buf: [u8; LINE_CAPACITY],
    len: usize,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            buf: [0; LINE_CAPACITY],
            len: 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn is_full(&self) -> bool {
        self.len == LINE_CAPACITY
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = LINE_CAPACITY - self.len;
        let take = s.len().min(room);
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}

/// Formats `args` plus a newline and writes it to stderr.
pub fn write_line(args: fmt::Arguments<'_>) {
    let mut line = LineBuffer::new();
    let _ = line.write_fmt(args);
    if line.is_full() {
        line.len -= 1;
    }
    let _ = line.write_str("\n");
    write_stderr(line.as_bytes());
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn write_stderr(bytes: &[u8]) {
            let mut rest = bytes;
            while !rest.is_empty() {
                let n = unsafe { libc::write(libc::STDERR_FILENO, rest.as_ptr().cast(), rest.len()) };
                if n <= 0 {
                    break;
                }
                rest = &rest[n as usize..];
            }
        }
    } else {
        fn write_stderr(_bytes: &[u8]) {}
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "debug")] {
        #[macro_export]
        macro_rules! writeln {
            ($($arg:tt)*) => {
                $crate::write_line(format_args!($($arg)*))
            };
        }
    } else {
        #[macro_export]
        macro_rules! writeln {
            ($($arg:tt)*) => {
                if false {
                    $crate::write_line(format_args!($($arg)*))
                }
            };
        }
    }
}
