/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Shared code for the CM7 system call demo: Traveo II platform drivers, the
//! console, and the IPC system call protocol spoken with the supervisor core.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::nonstandard_macro_braces)] // https://github.com/shepmaster/snafu/issues/296

#[macro_use]
pub mod macros;

/// Architecture-specific code.
pub mod arch;

pub mod console;
pub mod devices;
mod mmio_deref_wrapper;
pub mod panic;
pub mod platform;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod sync;
pub mod syscall;

pub use mmio_deref_wrapper::MMIODerefWrapper;
