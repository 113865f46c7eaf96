/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! CM7_0 application: each press of USER1 asks the supervisor core for a
//! system call, alternating between erasing a work-flash sector and reading
//! the factory hash.
//!
//! Built for the device it runs on bare metal. Built for the host it runs
//! against a simulated supervisor, with Enter standing in for the button.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

/// Printed whenever the application is ready for the next press.
const PROMPT: &str = "Press user switch USER1 to invoke system call from Host";

#[cfg(target_os = "none")]
mod firmware;

#[cfg(not(target_os = "none"))]
mod simulated;

#[cfg(not(target_os = "none"))]
fn main() {
    simulated::main()
}
