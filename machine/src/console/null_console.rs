use crate::{console::interface, devices::serial::SerialOps};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// A dummy console that just ignores all I/O.
pub struct NullConsole;

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

pub static NULL_CONSOLE: NullConsole = NullConsole {};

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl interface::Write for NullConsole {
    fn write_fmt(&self, _args: core::fmt::Arguments) -> core::fmt::Result {
        Ok(())
    }
}

impl interface::ConsoleOps for NullConsole {
    fn write_char(&self, _c: char) {}

    fn write_string(&self, _string: &str) {}
}

impl SerialOps for NullConsole {}

impl interface::All for NullConsole {}
