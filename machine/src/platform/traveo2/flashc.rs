/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Flash controller: the work-flash write gate.

use {
    super::map,
    crate::{syscall::interface::WorkFlash, MMIODerefWrapper},
    tock_registers::{
        interfaces::{ReadWriteable, Readable},
        register_bitfields, register_structs,
        registers::ReadWrite,
    },
};

register_bitfields! {
    u32,

    WORK_FLASH_SAFETY [
        /// Work flash may be programmed and erased while set.
        WORK_FLASH_SAFETY_EN OFFSET(0) NUMBITS(1) [
            Locked = 0,
            Writable = 1
        ]
    ]
}

register_structs! {
    /// Subset of the FM_CTL_ECT block.
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x00 => __reserved_1),
        (0x10 => WORK_FLASH_SAFETY: ReadWrite<u32, WORK_FLASH_SAFETY::Register>),
        (0x14 => @END),
    }
}

type Registers = MMIODerefWrapper<RegisterBlock>;

pub struct WorkFlashController {
    registers: Registers,
}

impl Default for WorkFlashController {
    fn default() -> Self {
        unsafe { WorkFlashController::new(map::FLASHC_FM_CTL_ECT) }
    }
}

impl WorkFlashController {
    /// # Safety
    ///
    /// Unsafe, duh!
    pub const unsafe fn new(base_addr: usize) -> WorkFlashController {
        WorkFlashController {
            registers: Registers::new(base_addr),
        }
    }

    pub fn write_enable(&self) {
        self.registers
            .WORK_FLASH_SAFETY
            .modify(WORK_FLASH_SAFETY::WORK_FLASH_SAFETY_EN::Writable);
    }

    pub fn write_disable(&self) {
        self.registers
            .WORK_FLASH_SAFETY
            .modify(WORK_FLASH_SAFETY::WORK_FLASH_SAFETY_EN::Locked);
    }

    pub fn is_write_enabled(&self) -> bool {
        self.registers
            .WORK_FLASH_SAFETY
            .is_set(WORK_FLASH_SAFETY::WORK_FLASH_SAFETY_EN)
    }
}

impl WorkFlash for WorkFlashController {
    fn write_enable(&self) {
        WorkFlashController::write_enable(self)
    }

    fn write_disable(&self) {
        WorkFlashController::write_disable(self)
    }
}
