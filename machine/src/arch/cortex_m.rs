/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Cortex-M7 implementation.

use cortex_m::{
    asm,
    interrupt::{self, InterruptNumber},
    peripheral::NVIC,
    Peripherals,
};

/// CPU interrupt line as seen by the NVIC.
#[derive(Clone, Copy)]
struct CpuIrq(u16);

// SAFETY: values are limited to the CPU interrupt lines validated by the
// interrupt multiplexer driver.
unsafe impl InterruptNumber for CpuIrq {
    fn number(self) -> u16 {
        self.0
    }
}

/// Park the core, waking only to service interrupts.
pub fn endless_sleep() -> ! {
    loop {
        asm::wfi();
    }
}

#[inline]
pub fn nop() {
    asm::nop();
}

/// Order all preceding memory accesses before any following ones.
#[inline]
pub fn data_barrier() {
    asm::dmb();
}

/// Unmask interrupts globally.
pub fn enable_interrupts() {
    unsafe { interrupt::enable() }
}

/// Set the priority of a CPU interrupt line and unmask it in the NVIC.
pub fn enable_irq(irq: u16, priority: u8) {
    // SAFETY: called during bring-up, nothing else is touching the NVIC yet.
    unsafe {
        let mut peripherals = Peripherals::steal();
        peripherals
            .NVIC
            .set_priority(CpuIrq(irq), priority << (8 - super::NVIC_PRIO_BITS));
        NVIC::unmask(CpuIrq(irq));
    }
}

/// The supervisor core reads the scratch buffer straight from SRAM, so the
/// CM7 data cache must not hold stale lines of it.
pub fn disable_data_cache() {
    // SAFETY: called once before any other use of the SCB.
    unsafe {
        let mut peripherals = Peripherals::steal();
        peripherals.SCB.disable_dcache(&mut peripherals.CPUID);
    }
}
