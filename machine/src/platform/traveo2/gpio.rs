/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! GPIO port driver with per-pin interrupt configuration.

use {
    crate::{syscall::interface::EdgeAck, MMIODerefWrapper},
    core::marker::PhantomData,
    snafu::Snafu,
    tock_registers::{
        fields::FieldValue,
        interfaces::{ReadWriteable, Readable, Writeable},
        register_structs,
        registers::{ReadOnly, ReadWrite, WriteOnly},
    },
};

/// Generates `pub enum`s with no variants for each `ident` passed in.
macro_rules! states {
    ($($name:ident),*) => {
        $(pub enum $name {})*
    };
}

// Possible states for a GPIO pin.
states! {
    Uninitialized, Input
}

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x00 => pub OUT: ReadWrite<u32>),
        (0x04 => pub OUT_CLR: WriteOnly<u32>),
        (0x08 => pub OUT_SET: WriteOnly<u32>),
        (0x0c => pub OUT_INV: WriteOnly<u32>),
        (0x10 => pub IN: ReadOnly<u32>),
        (0x14 => pub INTR: ReadWrite<u32>), // write 1 to clear
        (0x18 => pub INTR_MASK: ReadWrite<u32>),
        (0x1c => pub INTR_MASKED: ReadOnly<u32>),
        (0x20 => pub INTR_SET: ReadWrite<u32>),
        (0x24 => __reserved_1),
        (0x40 => pub INTR_CFG: ReadWrite<u32>), // 2 bits per pin
        (0x44 => pub CFG: ReadWrite<u32>), // 4 bits per pin: IN_EN | DRIVE_MODE
        (0x48 => pub CFG_IN: ReadWrite<u32>),
        (0x4c => pub CFG_OUT: ReadWrite<u32>),
        (0x50 => __reserved_2),
        (0x80 => @END),
    }
}

register_structs! {
    /// High-speed I/O matrix, one block per port.
    #[allow(non_snake_case)]
    HsiomBlock {
        (0x00 => pub PORT_SEL: [ReadWrite<u32>; 2]), // 8 bits per pin, pins 0..3 then 4..7
        (0x08 => __reserved_1),
        (0x10 => @END),
    }
}

// Hide register blocks from public api.
type Registers = MMIODerefWrapper<RegisterBlock>;
type HsiomRegisters = MMIODerefWrapper<HsiomBlock>;

pub const PINS_PER_PORT: usize = 8;

/// HSIOM selection routing a pin to its GPIO port.
const HSIOM_SEL_GPIO: u32 = 0;
/// Strong pull-up, input buffer on.
const DRIVE_MODE_PULLUP_IN: u32 = 0b1010;

#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    #[snafu(display("GPIO pin {} exceeds maximum of {}", pin, PINS_PER_PORT - 1))]
    InvalidPin { pin: usize },
}

pub type Result<T> = ::core::result::Result<T, GpioError>;

/// Edge that raises a pin interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Edge {
    Disabled = 0b00,
    Rising = 0b01,
    Falling = 0b10,
    Both = 0b11,
}

/// One GPIO port together with its HSIOM block.
pub struct Port {
    registers: Registers,
    hsiom: HsiomRegisters,
}

impl Port {
    /// # Safety
    ///
    /// Both addresses must point at the register blocks of the same port.
    pub const unsafe fn new(base_addr: usize, hsiom_addr: usize) -> Port {
        Port {
            registers: Registers::new(base_addr),
            hsiom: HsiomRegisters::new(hsiom_addr),
        }
    }

    pub fn pin(&self, pin: usize) -> Result<Pin<Uninitialized>> {
        if pin >= PINS_PER_PORT {
            return Err(GpioError::InvalidPin { pin });
        }
        Ok(unsafe { Pin::new(pin, self.registers.base_addr(), self.hsiom.base_addr()) })
    }
}

/// A GPIO pin in state `State`.
///
/// A `Pin` starts in the `Uninitialized` state and has to be configured with
/// `into_pull_up_input` before its level or interrupt can be used.
pub struct Pin<State> {
    pin: usize,
    registers: Registers,
    hsiom: HsiomRegisters,
    _state: PhantomData<State>,
}

impl<State> Pin<State> {
    #[inline(always)]
    fn transition<NewState>(self) -> Pin<NewState> {
        Pin {
            pin: self.pin,
            registers: self.registers,
            hsiom: self.hsiom,
            _state: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.pin
    }
}

impl Pin<Uninitialized> {
    unsafe fn new(pin: usize, base_addr: usize, hsiom_addr: usize) -> Pin<Uninitialized> {
        Pin {
            pin,
            registers: Registers::new(base_addr),
            hsiom: HsiomRegisters::new(hsiom_addr),
            _state: PhantomData,
        }
    }

    /// Route the pin to GPIO as an input with pull-up, output latch high.
    pub fn into_pull_up_input(self) -> Pin<Input> {
        let off = self.pin;
        self.registers
            .OUT
            .modify(FieldValue::<u32, ()>::new(0b1, off, 1));
        self.registers
            .CFG
            .modify(FieldValue::<u32, ()>::new(0b1111, off * 4, DRIVE_MODE_PULLUP_IN));
        self.hsiom.PORT_SEL[off / 4].modify(FieldValue::<u32, ()>::new(
            0b1_1111,
            (off % 4) * 8,
            HSIOM_SEL_GPIO,
        ));
        self.transition()
    }
}

pub type Level = bool;

impl Pin<Input> {
    /// Returns `true` if the level is high. The user button reads low while pressed.
    pub fn level(&self) -> Level {
        self.registers
            .IN
            .matches_all(FieldValue::<u32, ()>::new(1, self.pin, 1))
    }

    pub fn set_interrupt_edge(&self, edge: Edge) {
        self.registers
            .INTR_CFG
            .modify(FieldValue::<u32, ()>::new(0b11, self.pin * 2, edge as u32));
    }

    /// Let the pin interrupt through to the port interrupt line.
    pub fn set_interrupt_mask(&self, enabled: bool) {
        self.registers.INTR_MASK.modify(FieldValue::<u32, ()>::new(
            0b1,
            self.pin,
            u32::from(enabled),
        ));
    }

    /// Handle for acknowledging this pin's interrupt from a handler.
    pub fn interrupt(&self) -> PinInterrupt {
        unsafe { PinInterrupt::new(self.registers.base_addr(), self.pin) }
    }
}

/// Interrupt status bit of one pin, usable from an interrupt handler.
pub struct PinInterrupt {
    registers: Registers,
    pin: usize,
}

impl PinInterrupt {
    /// # Safety
    ///
    /// `base_addr` must be a GPIO port block and `pin` below [`PINS_PER_PORT`].
    pub const unsafe fn new(base_addr: usize, pin: usize) -> PinInterrupt {
        PinInterrupt {
            registers: Registers::new(base_addr),
            pin,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.registers.INTR.get() & (1 << self.pin) != 0
    }

    /// Clear the pending interrupt of this pin.
    pub fn clear_interrupt(&self) {
        self.registers.INTR.set(1 << self.pin);
        // Read back so the clear has landed before the handler returns.
        let _ = self.registers.INTR.get();
    }
}

impl EdgeAck for PinInterrupt {
    fn acknowledge(&self) {
        self.clear_interrupt();
    }
}
