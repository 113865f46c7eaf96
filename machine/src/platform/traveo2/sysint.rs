/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! System interrupt multiplexer of the CM7 core.
//!
//! Peripheral ("system") interrupts do not reach the NVIC directly: each one
//! is routed onto one of eight CPU interrupts, and the CPU interrupt handler
//! asks INT_STATUS which system interrupt fired.

use {
    super::map,
    crate::{
        arch,
        sync::{interface::Mutex, NullLock},
        MMIODerefWrapper,
    },
    snafu::Snafu,
    tock_registers::{
        interfaces::{Readable, Writeable},
        register_bitfields, register_structs,
        registers::{ReadOnly, ReadWrite},
    },
};

register_bitfields! {
    u32,

    INT_STATUS [
        SYSTEM_INT_IDX OFFSET(0) NUMBITS(10) [],
        SYSTEM_INT_VALID OFFSET(31) NUMBITS(1) []
    ],

    SYSTEM_INT_CTL [
        CPU_INT_IDX OFFSET(0) NUMBITS(3) [],
        CPU_INT_VALID OFFSET(31) NUMBITS(1) []
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    StatusBlock {
        (0x00 => INT_STATUS: [ReadOnly<u32, INT_STATUS::Register>; 8]),
        (0x20 => @END),
    }
}

register_structs! {
    #[allow(non_snake_case)]
    ControlBlock {
        (0x0000 => SYSTEM_INT_CTL: [ReadWrite<u32, SYSTEM_INT_CTL::Register>; 1024]),
        (0x1000 => @END),
    }
}

type StatusRegisters = MMIODerefWrapper<StatusBlock>;
type ControlRegisters = MMIODerefWrapper<ControlBlock>;

/// CPU interrupts available to the multiplexer.
pub const CPU_IRQ_COUNT: u16 = 8;
pub const SYSTEM_INTERRUPT_COUNT: u16 = 1024;
/// Handlers the multiplexer can hold at once.
pub const HANDLER_SLOTS: usize = 8;

#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
pub enum SysIntError {
    #[snafu(display("system interrupt {} does not exist", index))]
    InvalidSource { index: u16 },
    #[snafu(display("CPU interrupt {} is not a multiplexed interrupt", cpu_irq))]
    InvalidCpuIrq { cpu_irq: u16 },
    #[snafu(display("interrupt priority {} is out of range", priority))]
    InvalidPriority { priority: u8 },
    #[snafu(display("interrupt handler table is full"))]
    TableFull,
}

pub type Result<T> = ::core::result::Result<T, SysIntError>;

/// Routing of one system interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemInterrupt {
    pub source: u16,
    pub cpu_irq: u16,
    pub priority: u8,
}

#[derive(Clone, Copy)]
struct Handler {
    source: u16,
    handler: fn(),
}

pub struct InterruptMux {
    status: StatusRegisters,
    control: ControlRegisters,
    handlers: NullLock<[Option<Handler>; HANDLER_SLOTS]>,
}

impl InterruptMux {
    /// # Safety
    ///
    /// Addresses must be the INT_STATUS and SYSTEM_INT_CTL arrays of one core.
    pub const unsafe fn new(status_addr: usize, control_addr: usize) -> InterruptMux {
        InterruptMux {
            status: StatusRegisters::new(status_addr),
            control: ControlRegisters::new(control_addr),
            handlers: NullLock::new([None; HANDLER_SLOTS]),
        }
    }

    /// The CM7_0 multiplexer.
    ///
    /// # Safety
    ///
    /// Only one instance may exist.
    pub const unsafe fn cm7_0() -> InterruptMux {
        InterruptMux::new(map::CM7_0_INT_STATUS, map::CM7_0_SYSTEM_INT_CTL)
    }

    /// Route `irq` onto its CPU interrupt and register its handler.
    ///
    /// Call before interrupts are enabled.
    pub fn init(&self, irq: &SystemInterrupt, handler: fn()) -> Result<()> {
        if irq.source >= SYSTEM_INTERRUPT_COUNT {
            return Err(SysIntError::InvalidSource { index: irq.source });
        }
        if irq.cpu_irq >= CPU_IRQ_COUNT {
            return Err(SysIntError::InvalidCpuIrq {
                cpu_irq: irq.cpu_irq,
            });
        }
        if irq.priority >= 1 << arch::NVIC_PRIO_BITS {
            return Err(SysIntError::InvalidPriority {
                priority: irq.priority,
            });
        }

        self.handlers.lock(|table| -> Result<()> {
            let slot = table
                .iter()
                .position(|entry| matches!(entry, Some(h) if h.source == irq.source))
                .or_else(|| table.iter().position(Option::is_none))
                .ok_or(SysIntError::TableFull)?;
            table[slot] = Some(Handler {
                source: irq.source,
                handler,
            });
            Ok(())
        })?;

        self.control.SYSTEM_INT_CTL[usize::from(irq.source)].write(
            SYSTEM_INT_CTL::CPU_INT_IDX.val(u32::from(irq.cpu_irq))
                + SYSTEM_INT_CTL::CPU_INT_VALID::SET,
        );
        Ok(())
    }

    /// Set the priority of the CPU interrupt `irq` is routed to and unmask it.
    pub fn enable_cpu_irq(&self, irq: &SystemInterrupt) {
        arch::enable_irq(irq.cpu_irq, irq.priority);
    }

    /// Call the handler of the system interrupt pending on `cpu_irq`.
    ///
    /// Returns `false` when nothing registered was pending.
    pub fn dispatch(&self, cpu_irq: u16) -> bool {
        if cpu_irq >= CPU_IRQ_COUNT {
            return false;
        }
        let status = &self.status.INT_STATUS[usize::from(cpu_irq)];
        if !status.is_set(INT_STATUS::SYSTEM_INT_VALID) {
            return false;
        }
        let source = status.read(INT_STATUS::SYSTEM_INT_IDX) as u16;

        let handler = self.handlers.lock(|table| {
            table
                .iter()
                .flatten()
                .find(|entry| entry.source == source)
                .map(|entry| entry.handler)
        });
        match handler {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        core::sync::atomic::{AtomicU32, Ordering},
    };

    struct Ram {
        status: [u32; 8],
        control: [u32; 1024],
    }

    impl Ram {
        fn new() -> Box<Self> {
            Box::new(Ram {
                status: [0; 8],
                control: [0; 1024],
            })
        }

        fn mux(&mut self) -> InterruptMux {
            unsafe {
                InterruptMux::new(
                    &mut self.status as *mut _ as usize,
                    &mut self.control as *mut _ as usize,
                )
            }
        }
    }

    const BUTTON: SystemInterrupt = SystemInterrupt {
        source: 23,
        cpu_irq: 3,
        priority: 7,
    };

    #[test]
    fn init_routes_the_source_to_the_cpu_irq() {
        let mut ram = Ram::new();
        let mux = ram.mux();
        mux.init(&BUTTON, || {}).unwrap();
        assert_eq!(ram.control[23], (1 << 31) | 3);
    }

    #[test]
    fn init_rejects_out_of_range_parameters() {
        let mut ram = Ram::new();
        let mux = ram.mux();
        let check = |irq: SystemInterrupt| mux.init(&irq, || {});

        assert_eq!(
            check(SystemInterrupt {
                source: 1024,
                ..BUTTON
            }),
            Err(SysIntError::InvalidSource { index: 1024 })
        );
        assert_eq!(
            check(SystemInterrupt {
                cpu_irq: 8,
                ..BUTTON
            }),
            Err(SysIntError::InvalidCpuIrq { cpu_irq: 8 })
        );
        assert_eq!(
            check(SystemInterrupt {
                priority: 8,
                ..BUTTON
            }),
            Err(SysIntError::InvalidPriority { priority: 8 })
        );
        assert!(ram.control.iter().all(|&word| word == 0));
    }

    #[test]
    fn table_fills_up_but_accepts_re_registration() {
        let mut ram = Ram::new();
        let mux = ram.mux();
        for source in 0..HANDLER_SLOTS as u16 {
            mux.init(&SystemInterrupt { source, ..BUTTON }, || {}).unwrap();
        }
        assert_eq!(
            mux.init(&SystemInterrupt { source: 100, ..BUTTON }, || {}),
            Err(SysIntError::TableFull)
        );
        assert_eq!(mux.init(&SystemInterrupt { source: 2, ..BUTTON }, || {}), Ok(()));
    }

    static CALLS: AtomicU32 = AtomicU32::new(0);

    fn count_call() {
        CALLS.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn dispatch_calls_the_pending_handler() {
        let mut ram = Ram::new();
        let status = ram.status.as_mut_ptr();
        let mux = unsafe { InterruptMux::new(status as usize, ram.control.as_mut_ptr() as usize) };
        mux.init(&BUTTON, count_call).unwrap();

        assert!(!mux.dispatch(3));
        unsafe { status.add(3).write_volatile((1 << 31) | 42) };
        assert!(!mux.dispatch(3));
        unsafe { status.add(3).write_volatile((1 << 31) | 23) };
        assert!(mux.dispatch(3));
        assert!(!mux.dispatch(9));
        assert_eq!(CALLS.load(Ordering::Relaxed), 1);
    }
}
