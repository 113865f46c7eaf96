/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! System calls executed by the supervisor core on behalf of CM7.
//!
//! A call is marshalled into a [`ScratchBuffer`] in SRAM, the buffer address is
//! sent as the data word of an IPC message, and the supervisor signals
//! completion by releasing the IPC lock after writing its status (and any
//! result words) back into the same buffer.
//!
//! ```text
//!  word | request                | completion
//! ------+------------------------+----------------------------------------
//!    0  | opcode                 | status word, bits 28..32 = status code
//!    1  | sector address (erase) | hash word 0 (hash)
//!  2..4 | -                      | hash words 1..3 (hash)
//!    5  | -                      | zero-check word (hash)
//! ```

use {bitflags::bitflags, snafu::Snafu};

pub mod buffer;
pub mod dispatcher;
pub mod latch;
pub mod report;
pub mod status;

pub use {
    buffer::{BufferError, Owner, ScratchBuffer, SharedBuffer, SCRATCH_WORDS},
    dispatcher::{DispatchConfig, DispatchError, Dispatcher, DEFAULT_LOCK_POLL_LIMIT},
    latch::{RequestKind, RequestLatch},
    report::{FactoryHash, Outcome, Report},
    status::Verdict,
};

/// Opcodes understood by the supervisor.
pub mod opcode {
    /// EraseSector in blocking mode.
    pub const ERASE_SECTOR_BLOCKING: u32 = 0x1400_0100;
    /// GenerateHash returning the factory hash.
    pub const GENERATE_HASH_FACTORY: u32 = 0x1E00_0100;
}

/// Address of the first large sector of the work flash.
pub const WORK_FLASH_FIRST_LARGE_SECTOR: u32 = 0x1400_0000;

bitflags! {
    /// IPC interrupt structures to notify when sending a message.
    pub struct IpcNotify: u32 {
        /// Interrupt structure 0, serviced by the supervisor (CM0+) for system calls.
        const STRUCT_0 = 1 << 0;
        const STRUCT_1 = 1 << 1;
        const STRUCT_2 = 1 << 2;
        const STRUCT_3 = 1 << 3;
        const STRUCT_4 = 1 << 4;
        const STRUCT_5 = 1 << 5;
        const STRUCT_6 = 1 << 6;
        const STRUCT_7 = 1 << 7;
    }
}

#[derive(Snafu, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcError {
    #[snafu(display("IPC channel {} does not exist", channel))]
    InvalidChannel { channel: usize },
    #[snafu(display("IPC lock is held by another master, message not sent"))]
    LockUnavailable,
    #[snafu(display("payload {:#x} does not fit the 32-bit IPC data register", payload))]
    PayloadRange { payload: usize },
}

/// Interfaces between the dispatcher and the hardware (or a simulation of it).
pub mod interface {
    use super::{IpcError, IpcNotify};

    /// One IPC channel: a lock, a data word and a doorbell.
    pub trait IpcChannel {
        /// Acquire the channel lock, store `payload` in the data register and
        /// ring the doorbell of the `notify` interrupt structures.
        ///
        /// Reports only whether the message was accepted, not completion.
        fn send_message(&self, notify: IpcNotify, payload: usize) -> Result<(), IpcError>;

        /// Whether the channel lock is currently held.
        fn is_lock_acquired(&self) -> bool;
    }

    /// Write access gate of the work flash.
    pub trait WorkFlash {
        fn write_enable(&self);
        fn write_disable(&self);
    }

    /// Acknowledges an edge interrupt at its source.
    pub trait EdgeAck {
        fn acknowledge(&self);
    }

    impl<T: IpcChannel + ?Sized> IpcChannel for &T {
        fn send_message(&self, notify: IpcNotify, payload: usize) -> Result<(), IpcError> {
            (**self).send_message(notify, payload)
        }

        fn is_lock_acquired(&self) -> bool {
            (**self).is_lock_acquired()
        }
    }

    impl<T: WorkFlash + ?Sized> WorkFlash for &T {
        fn write_enable(&self) {
            (**self).write_enable()
        }

        fn write_disable(&self) {
            (**self).write_disable()
        }
    }
}

/// Longest request the supervisor accepts from this core.
pub const MAX_REQUEST_WORDS: usize = 2;

/// A privileged operation to be carried out by the supervisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemCall {
    /// Erase one work-flash sector, blocking until done.
    EraseSector { address: u32 },
    /// Return the factory hash.
    FactoryHash,
}

/// Encoded request words of a [`SystemCall`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    words: [u32; MAX_REQUEST_WORDS],
    len: usize,
}

impl Request {
    pub fn as_slice(&self) -> &[u32] {
        &self.words[..self.len]
    }
}

impl SystemCall {
    pub fn opcode(&self) -> u32 {
        match self {
            SystemCall::EraseSector { .. } => opcode::ERASE_SECTOR_BLOCKING,
            SystemCall::FactoryHash => opcode::GENERATE_HASH_FACTORY,
        }
    }

    pub fn request(&self) -> Request {
        match *self {
            SystemCall::EraseSector { address } => Request {
                words: [self.opcode(), address],
                len: 2,
            },
            SystemCall::FactoryHash => Request {
                words: [self.opcode(), 0],
                len: 1,
            },
        }
    }

    /// Whether work-flash write access has to be open while the call runs.
    pub fn writes_work_flash(&self) -> bool {
        matches!(self, SystemCall::EraseSector { .. })
    }

    /// Short human-readable name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            SystemCall::EraseSector { .. } => "Work-flash erase sector",
            SystemCall::FactoryHash => "Generate Hash",
        }
    }

    /// Line announcing the call before it is sent.
    pub fn banner(&self) -> &'static str {
        match self {
            SystemCall::EraseSector { .. } => "System Call request to erase a work-flash sector",
            SystemCall::FactoryHash => "System Call request to Generate Hash (Factory Hash)",
        }
    }
}
