/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Hosted stand-ins, used by unit tests and the simulated build.

/// There is nothing to wake up for on the host.
pub fn endless_sleep() -> ! {
    loop {
        core::hint::spin_loop();
    }
}

#[inline]
pub fn nop() {
    core::hint::spin_loop();
}

#[inline]
pub fn data_barrier() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

pub fn enable_interrupts() {}

pub fn enable_irq(_irq: u16, _priority: u8) {}

pub fn disable_data_cache() {}
