/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Scratch buffer shared with the supervisor core, and the ownership protocol
//! around it.

use {
    core::{
        cell::UnsafeCell,
        fmt, mem,
        ptr,
        sync::atomic::{fence, Ordering},
    },
    snafu::Snafu,
    static_assertions::const_assert_eq,
};

/// Words in the scratch buffer.
pub const SCRATCH_WORDS: usize = 8;

/// Word array the supervisor reads requests from and writes results to.
///
/// Must live in SRAM visible to the supervisor, outside any tightly coupled
/// memory, and must not be cached by CM7.
#[repr(C, align(16))]
pub struct ScratchBuffer {
    words: UnsafeCell<[u32; SCRATCH_WORDS]>,
}

const_assert_eq!(mem::size_of::<ScratchBuffer>(), SCRATCH_WORDS * 4);

// SAFETY: all access goes through volatile operations gated by SharedBuffer.
unsafe impl Sync for ScratchBuffer {}

impl ScratchBuffer {
    pub const fn new() -> Self {
        Self {
            words: UnsafeCell::new([0; SCRATCH_WORDS]),
        }
    }

    /// Address handed to the supervisor.
    pub fn as_ptr(&self) -> *mut u32 {
        self.words.get().cast()
    }

    fn load(&self, index: usize) -> u32 {
        debug_assert!(index < SCRATCH_WORDS);
        unsafe { ptr::read_volatile(self.as_ptr().add(index)) }
    }

    fn store(&self, index: usize, value: u32) {
        debug_assert!(index < SCRATCH_WORDS);
        unsafe { ptr::write_volatile(self.as_ptr().add(index), value) }
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Which side may touch the scratch buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    /// This core may read and write it.
    Local,
    /// The supervisor holds it until the IPC lock is seen released.
    Remote,
}

#[derive(Snafu, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[snafu(display("scratch buffer is owned by the {:?} side", owner))]
    NotOwned { owner: Owner },
    #[snafu(display("{} request words do not fit the scratch buffer", len))]
    Overflow { len: usize },
    #[snafu(display("word {} is outside the scratch buffer", index))]
    OutOfRange { index: usize },
}

pub type Result<T> = core::result::Result<T, BufferError>;

/// A scratch buffer together with its ownership tag.
///
/// Local → [`hand_over`](Self::hand_over) → Remote → [`reclaim`](Self::reclaim) → Local.
/// Reads and writes are refused while the supervisor owns the buffer.
pub struct SharedBuffer<'a> {
    buffer: &'a ScratchBuffer,
    owner: Owner,
}

impl<'a> SharedBuffer<'a> {
    pub fn new(buffer: &'a ScratchBuffer) -> Self {
        Self {
            buffer,
            owner: Owner::Local,
        }
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    fn ensure_local(&self) -> Result<()> {
        match self.owner {
            Owner::Local => Ok(()),
            owner => Err(BufferError::NotOwned { owner }),
        }
    }

    /// Clear the buffer and write a request at its start.
    ///
    /// Clearing keeps words of an earlier, differently shaped result from
    /// being read back as part of this call's result.
    pub fn prepare(&mut self, request: &[u32]) -> Result<()> {
        self.ensure_local()?;
        if request.len() > SCRATCH_WORDS {
            return Err(BufferError::Overflow { len: request.len() });
        }
        for index in 0..SCRATCH_WORDS {
            self.buffer
                .store(index, request.get(index).copied().unwrap_or(0));
        }
        Ok(())
    }

    /// Read one word.
    pub fn word(&self, index: usize) -> Result<u32> {
        self.ensure_local()?;
        if index >= SCRATCH_WORDS {
            return Err(BufferError::OutOfRange { index });
        }
        Ok(self.buffer.load(index))
    }

    /// Give the buffer to the supervisor, returning the address to send it.
    pub fn hand_over(&mut self) -> Result<usize> {
        self.ensure_local()?;
        // Request words must be in memory before the address is published.
        fence(Ordering::Release);
        self.owner = Owner::Remote;
        Ok(self.buffer.as_ptr() as usize)
    }

    /// Take the buffer back.
    ///
    /// Only call once the IPC lock has been observed released, or when the
    /// send that would have transferred it was refused.
    pub fn reclaim(&mut self) {
        fence(Ordering::Acquire);
        self.owner = Owner::Local;
    }
}

impl fmt::Debug for SharedBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "scratch @ {:p}, owner {:?}", self.buffer.as_ptr(), self.owner)?;
        if self.owner == Owner::Local {
            for index in 0..SCRATCH_WORDS {
                writeln!(f, "[{:02}] {:08x}", index, self.buffer.load(index))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_aligned_for_the_supervisor() {
        let scratch = ScratchBuffer::new();
        assert_eq!(scratch.as_ptr() as usize % 16, 0);
    }

    #[test]
    fn prepare_writes_request_and_clears_the_rest() {
        let scratch = ScratchBuffer::new();
        for index in 0..SCRATCH_WORDS {
            scratch.store(index, 0xdead_beef);
        }
        let mut shared = SharedBuffer::new(&scratch);
        shared.prepare(&[0x1E00_0100]).unwrap();
        assert_eq!(shared.word(0), Ok(0x1E00_0100));
        for index in 1..SCRATCH_WORDS {
            assert_eq!(shared.word(index), Ok(0));
        }
    }

    #[test]
    fn remote_owned_buffer_refuses_access() {
        let scratch = ScratchBuffer::new();
        let mut shared = SharedBuffer::new(&scratch);
        shared.prepare(&[1, 2]).unwrap();
        let address = shared.hand_over().unwrap();
        assert_eq!(address, scratch.as_ptr() as usize);
        assert_eq!(shared.owner(), Owner::Remote);

        let refused = Err(BufferError::NotOwned {
            owner: Owner::Remote,
        });
        assert_eq!(shared.word(0), refused);
        assert_eq!(shared.prepare(&[3]), refused.map(|_: u32| ()));
        assert_eq!(shared.hand_over(), refused.map(|_: u32| 0usize));

        shared.reclaim();
        assert_eq!(shared.owner(), Owner::Local);
        assert_eq!(shared.word(1), Ok(2));
    }

    #[test]
    fn results_written_by_the_remote_side_are_visible_after_reclaim() {
        let scratch = ScratchBuffer::new();
        let mut shared = SharedBuffer::new(&scratch);
        shared.prepare(&[0x1E00_0100]).unwrap();
        let address = shared.hand_over().unwrap() as *mut u32;
        unsafe {
            ptr::write_volatile(address, 0xA000_0000);
            ptr::write_volatile(address.add(5), 0);
        }
        shared.reclaim();
        assert_eq!(shared.word(0), Ok(0xA000_0000));
    }

    #[test]
    fn oversized_request_and_index_are_rejected() {
        let scratch = ScratchBuffer::new();
        let mut shared = SharedBuffer::new(&scratch);
        assert_eq!(
            shared.prepare(&[0; SCRATCH_WORDS + 1]),
            Err(BufferError::Overflow {
                len: SCRATCH_WORDS + 1
            })
        );
        assert_eq!(
            shared.word(SCRATCH_WORDS),
            Err(BufferError::OutOfRange {
                index: SCRATCH_WORDS
            })
        );
    }
}
