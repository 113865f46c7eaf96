/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Inter-processor communication structures.
//!
//! Each structure is a hardware lock with two data words and a doorbell into
//! the IPC interrupt structures. The sender acquires the lock and rings the
//! doorbell; the receiving core releases the lock once it is done.

use {
    super::map,
    crate::{
        arch,
        syscall::{interface::IpcChannel, IpcError, IpcNotify},
        MMIODerefWrapper,
    },
    static_assertions::const_assert_eq,
    tock_registers::{
        interfaces::{Readable, Writeable},
        register_bitfields, register_structs,
        registers::{ReadOnly, ReadWrite},
    },
};

register_bitfields! {
    u32,

    ACQUIRE [
        /// Reading the register attempts to acquire the lock; set when it was obtained.
        SUCCESS OFFSET(31) NUMBITS(1) [],
        /// Protection context of the master holding the lock.
        PC OFFSET(16) NUMBITS(4) [],
        /// Bus master holding the lock.
        MS OFFSET(8) NUMBITS(4) [],
    ],

    RELEASE [
        INTR_RELEASE OFFSET(0) NUMBITS(16) []
    ],

    NOTIFY [
        INTR_NOTIFY OFFSET(0) NUMBITS(16) []
    ],

    LOCK_STATUS [
        ACQUIRED OFFSET(31) NUMBITS(1) [],
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x00 => ACQUIRE: ReadOnly<u32, ACQUIRE::Register>),
        (0x04 => RELEASE: ReadWrite<u32, RELEASE::Register>),
        (0x08 => NOTIFY: ReadWrite<u32, NOTIFY::Register>),
        (0x0c => DATA0: ReadWrite<u32>),
        (0x10 => DATA1: ReadWrite<u32>),
        (0x14 => __reserved_1),
        (0x1c => LOCK_STATUS: ReadOnly<u32, LOCK_STATUS::Register>),
        (0x20 => @END),
    }
}

const_assert_eq!(core::mem::size_of::<RegisterBlock>(), map::IPC_STRUCT_STRIDE);

type Registers = MMIODerefWrapper<RegisterBlock>;

pub const IPC_STRUCT_COUNT: usize = 8;

pub type Result<T> = ::core::result::Result<T, IpcError>;

/// The IPC block of the device.
pub struct Ipc {
    base_addr: usize,
}

impl Default for Ipc {
    fn default() -> Self {
        unsafe { Ipc::new(map::IPC_BASE) }
    }
}

impl Ipc {
    /// # Safety
    ///
    /// `base_addr` must point at [`IPC_STRUCT_COUNT`] consecutive IPC structures.
    pub const unsafe fn new(base_addr: usize) -> Ipc {
        Ipc { base_addr }
    }

    pub fn channel(&self, channel: usize) -> Result<IpcStruct> {
        if channel >= IPC_STRUCT_COUNT {
            return Err(IpcError::InvalidChannel { channel });
        }
        Ok(unsafe { IpcStruct::new(self.base_addr + channel * map::IPC_STRUCT_STRIDE) })
    }
}

/// One IPC structure.
pub struct IpcStruct {
    registers: Registers,
}

impl IpcStruct {
    /// # Safety
    ///
    /// Unsafe, duh!
    pub const unsafe fn new(base_addr: usize) -> IpcStruct {
        IpcStruct {
            registers: Registers::new(base_addr),
        }
    }

    /// Acquire the lock, pass `word` in DATA0 and notify the `notify` structures.
    ///
    /// The lock stays acquired; the receiver releases it.
    pub fn send_message_word(&self, notify: IpcNotify, word: u32) -> Result<()> {
        if !self.registers.ACQUIRE.is_set(ACQUIRE::SUCCESS) {
            return Err(IpcError::LockUnavailable);
        }
        self.registers.DATA0.set(word);
        // DATA0 has to reach the structure before the receiver is interrupted.
        arch::data_barrier();
        self.registers
            .NOTIFY
            .write(NOTIFY::INTR_NOTIFY.val(notify.bits()));
        Ok(())
    }

    pub fn is_lock_acquired(&self) -> bool {
        self.registers.LOCK_STATUS.is_set(LOCK_STATUS::ACQUIRED)
    }
}

impl IpcChannel for IpcStruct {
    fn send_message(&self, notify: IpcNotify, payload: usize) -> Result<()> {
        let word = u32::try_from(payload).map_err(|_| IpcError::PayloadRange { payload })?;
        self.send_message_word(notify, word)
    }

    fn is_lock_acquired(&self) -> bool {
        IpcStruct::is_lock_acquired(self)
    }
}
