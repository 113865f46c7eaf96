/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

/// Macro similar to [std](https://doc.rust-lang.org/src/std/macros.rs.html)
/// but for writing into the registered console (debug UART).
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::macros::_print(format_args!($($arg)*)));
}

/// Macro similar to [std](https://doc.rust-lang.org/src/std/macros.rs.html)
/// but for writing into the registered console (debug UART).
#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ({
        $crate::macros::_print(format_args!("{}\n", format_args!($($arg)*)));
    })
}

#[doc(hidden)]
pub fn _print(args: core::fmt::Arguments) {
    use crate::console::{console, interface};

    // Nowhere to report a failing console to.
    let _ = interface::Write::write_fmt(console(), args);
}

//--------------------------------------------------------------------------------------------------
//--------------------------------------------------------------------------------------------------

/// Prints info text, with a newline.
#[macro_export]
macro_rules! info {
    ($string:expr) => ({
        $crate::macros::_print(format_args!(concat!("[I] ", $string, "\n")));
    });
    ($format_string:expr, $($arg:tt)*) => ({
        $crate::macros::_print(format_args!(
            concat!("[I] ", $format_string, "\n"),
            $($arg)*
        ));
    })
}

/// Prints warning text, with a newline.
#[macro_export]
macro_rules! warn {
    ($string:expr) => ({
        $crate::macros::_print(format_args!(concat!("[W] ", $string, "\n")));
    });
    ($format_string:expr, $($arg:tt)*) => ({
        $crate::macros::_print(format_args!(
            concat!("[W] ", $format_string, "\n"),
            $($arg)*
        ));
    })
}
