/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Infineon Traveo II (CYT4BF) as seen from the CM7_0 core.

pub mod board;
pub mod flashc;
pub mod gpio;
pub mod ipc;
pub mod scb_uart;
pub mod sysint;

/// Peripheral memory map.
pub mod map {
    pub const CPUSS_BASE: usize = 0x4020_0000;
    /// Active system interrupt of each of the eight CM7_0 CPU interrupts.
    pub const CM7_0_INT_STATUS: usize = CPUSS_BASE + 0x0200;
    /// Routing of every system interrupt onto a CM7_0 CPU interrupt.
    pub const CM7_0_SYSTEM_INT_CTL: usize = CPUSS_BASE + 0xA000;

    pub const IPC_BASE: usize = 0x4022_0000;
    pub const IPC_STRUCT_STRIDE: usize = 0x20;

    pub const FLASHC_BASE: usize = 0x4024_0000;
    /// FM_CTL_ECT block, holding the work-flash safety register.
    pub const FLASHC_FM_CTL_ECT: usize = FLASHC_BASE + 0xF000;

    pub const HSIOM_BASE: usize = 0x4030_0000;
    pub const HSIOM_PRT_STRIDE: usize = 0x10;

    pub const GPIO_BASE: usize = 0x4031_0000;
    pub const GPIO_PRT_STRIDE: usize = 0x80;

    pub const SCB0_BASE: usize = 0x4060_0000;
    pub const SCB_STRIDE: usize = 0x1_0000;

    pub const fn gpio_port(port: usize) -> usize {
        GPIO_BASE + port * GPIO_PRT_STRIDE
    }

    pub const fn hsiom_port(port: usize) -> usize {
        HSIOM_BASE + port * HSIOM_PRT_STRIDE
    }

    pub const fn scb(index: usize) -> usize {
        SCB0_BASE + index * SCB_STRIDE
    }
}
