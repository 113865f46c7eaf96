use core::{marker::PhantomData, ops};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Typed view of a peripheral register block at a fixed address.
pub struct MMIODerefWrapper<T> {
    base_addr: usize,
    phantom: PhantomData<fn() -> T>,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl<T> MMIODerefWrapper<T> {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// You could specify any base address here, no checks.
    pub const unsafe fn new(start_addr: usize) -> Self {
        Self {
            base_addr: start_addr,
            phantom: PhantomData,
        }
    }

    pub const fn base_addr(&self) -> usize {
        self.base_addr
    }
}

/// Deref to RegisterBlock
///
/// Allows writing
/// ```ignore
/// self.registers.LOCK_STATUS.is_set(LOCK_STATUS::ACQUIRED)
/// ```
/// instead of something along the lines of
/// ```ignore
/// unsafe { (*IPC_STRUCT::ptr()).LOCK_STATUS.is_set(LOCK_STATUS::ACQUIRED) }
/// ```
impl<T> ops::Deref for MMIODerefWrapper<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { &*(self.base_addr as *const _) }
    }
}
