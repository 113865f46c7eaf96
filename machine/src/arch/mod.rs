/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Architecture-specific primitives: parking the core, barriers, NVIC.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "arm")] {
        mod cortex_m;
        pub use self::cortex_m::*;
    } else {
        mod host;
        pub use self::host::*;
    }
}

/// Number of priority bits implemented by the CM7 NVIC on Traveo II.
pub const NVIC_PRIO_BITS: u8 = 3;

/// Loop while a passed function returns `true`.
#[inline]
pub fn loop_while<F: Fn() -> bool>(f: F) {
    while f() {
        nop();
    }
}
