/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

/// Report the panic on the console and park the core.
///
/// Fatal conditions (failed board bring-up, a rejected IPC send) end up here.
pub fn handler(info: &core::panic::PanicInfo) -> ! {
    crate::println!("\n[!] {}", info);
    crate::console::console().flush();
    crate::arch::endless_sleep()
}
