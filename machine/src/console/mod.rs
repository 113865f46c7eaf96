/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

pub mod null_console;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Console interfaces.
pub mod interface {
    use {crate::devices::serial::SerialOps, core::fmt};

    /// Console write functions.
    pub trait Write {
        /// Write a Rust format string.
        fn write_fmt(&self, args: fmt::Arguments) -> fmt::Result;
    }

    /// A trait that must be implemented by devices that are candidates for the
    /// global console.
    pub trait ConsoleOps: SerialOps {
        /// Send a character
        fn write_char(&self, c: char) {
            let mut bytes = [0u8; 4];
            let _ = c.encode_utf8(&mut bytes);
            for &b in bytes.iter().take(c.len_utf8()) {
                self.write_byte(b);
            }
        }
        /// Display a string
        fn write_string(&self, string: &str) {
            for c in string.chars() {
                // convert newline to carriage return + newline
                if c == '\n' {
                    self.write_char('\r')
                }

                self.write_char(c);
            }
        }
    }

    /// Trait alias for a full-fledged console.
    pub trait All: Write + ConsoleOps {}
}

/// Adapter that lets `core::fmt` drive any console through `write_string`.
pub struct ConsoleWriter<'a, C: ?Sized>(pub &'a C);

impl<C: interface::ConsoleOps + ?Sized> core::fmt::Write for ConsoleWriter<'_, C> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0.write_string(s);
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

static CONSOLE: NullLock<&'static (dyn interface::All + Sync)> =
    NullLock::new(&null_console::NULL_CONSOLE);

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

use crate::sync::{interface::Mutex, NullLock};

/// Register a new console.
///
/// Call during bring-up, before interrupts are enabled.
pub fn register_console(new_console: &'static (dyn interface::All + Sync)) {
    CONSOLE.lock(|con| *con = new_console);
}

/// Return a reference to the currently registered console.
///
/// This is the global console used by all printing macros.
pub fn console() -> &'static dyn interface::All {
    CONSOLE.lock(|con| *con)
}

#[cfg(test)]
mod tests {
    use {
        super::{interface::ConsoleOps, *},
        crate::devices::SerialOps,
        core::{cell::RefCell, fmt::Write},
    };

    #[derive(Default)]
    struct Capture(RefCell<Vec<u8>>);

    impl SerialOps for Capture {
        fn write_byte(&self, byte: u8) {
            self.0.borrow_mut().push(byte);
        }
    }

    impl ConsoleOps for Capture {}

    #[test]
    fn newlines_are_sent_as_crlf() {
        let capture = Capture::default();
        capture.write_string("a\nb");
        assert_eq!(&*capture.0.borrow(), b"a\r\nb");
    }

    #[test]
    fn writer_formats_into_console() {
        let capture = Capture::default();
        write!(ConsoleWriter(&capture), "{:08X}", 0xA000_0000u32).unwrap();
        assert_eq!(&*capture.0.borrow(), b"A0000000");
    }
}
