/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Serial communication block in standard UART mode, used as the debug console.
//!
//! The SCB clock divider and the pin routing are left as the boot core set
//! them up; only the frame format and the FIFOs are configured here.

use {
    crate::{
        arch::loop_while,
        console::{interface, ConsoleWriter},
        devices::SerialOps,
        MMIODerefWrapper,
    },
    core::fmt,
    snafu::Snafu,
    tock_registers::{
        interfaces::{ReadWriteable, Readable, Writeable},
        register_bitfields, register_structs,
        registers::{ReadOnly, ReadWrite, WriteOnly},
    },
};

register_bitfields! {
    u32,

    CTRL [
        /// Oversampling factor minus one.
        OVS OFFSET(0) NUMBITS(4) [],
        MODE OFFSET(24) NUMBITS(2) [
            I2c = 0,
            Spi = 1,
            Uart = 2
        ],
        ENABLED OFFSET(31) NUMBITS(1) []
    ],

    UART_CTRL [
        MODE OFFSET(24) NUMBITS(2) [
            Standard = 0,
            SmartCard = 1,
            IrDA = 2
        ]
    ],

    /// Shared layout of UART_TX_CTRL and UART_RX_CTRL.
    UART_FRAME [
        /// Stop bits in half-bit units, minus one.
        STOP_BITS OFFSET(0) NUMBITS(3) [
            One = 1,
            Two = 3
        ],
        PARITY OFFSET(4) NUMBITS(1) [
            Even = 0,
            Odd = 1
        ],
        PARITY_ENABLED OFFSET(5) NUMBITS(1) []
    ],

    /// Shared layout of TX_CTRL and RX_CTRL.
    DATA_CTRL [
        /// Data bits minus one.
        DATA_WIDTH OFFSET(0) NUMBITS(4) [],
        MSB_FIRST OFFSET(8) NUMBITS(1) []
    ],

    FIFO_CTRL [
        TRIGGER_LEVEL OFFSET(0) NUMBITS(8) [],
        CLEAR OFFSET(16) NUMBITS(1) []
    ],

    FIFO_STATUS [
        USED OFFSET(0) NUMBITS(9) [],
        /// Shift register still holds a frame.
        SR_VALID OFFSET(15) NUMBITS(1) []
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x000 => CTRL: ReadWrite<u32, CTRL::Register>),
        (0x004 => __reserved_1),
        (0x040 => UART_CTRL: ReadWrite<u32, UART_CTRL::Register>),
        (0x044 => UART_TX_CTRL: ReadWrite<u32, UART_FRAME::Register>),
        (0x048 => UART_RX_CTRL: ReadWrite<u32, UART_FRAME::Register>),
        (0x04c => __reserved_2),
        (0x200 => TX_CTRL: ReadWrite<u32, DATA_CTRL::Register>),
        (0x204 => TX_FIFO_CTRL: ReadWrite<u32, FIFO_CTRL::Register>),
        (0x208 => TX_FIFO_STATUS: ReadOnly<u32, FIFO_STATUS::Register>),
        (0x20c => __reserved_3),
        (0x240 => TX_FIFO_WR: WriteOnly<u32>),
        (0x244 => __reserved_4),
        (0x300 => RX_CTRL: ReadWrite<u32, DATA_CTRL::Register>),
        (0x304 => RX_FIFO_CTRL: ReadWrite<u32, FIFO_CTRL::Register>),
        (0x308 => __reserved_5),
        (0x400 => @END),
    }
}

type Registers = MMIODerefWrapper<RegisterBlock>;

/// Bytes each hardware FIFO holds.
pub const FIFO_DEPTH: u32 = 128;

#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    #[snafu(display("UART oversampling factor {} is outside 8..=16", oversample))]
    InvalidOversample { oversample: u8 },
}

pub type Result<T> = ::core::result::Result<T, UartError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UartConfig {
    /// Clock cycles per bit; the baud rate is the SCB clock divided by this.
    pub oversample: u8,
}

impl Default for UartConfig {
    fn default() -> Self {
        UartConfig { oversample: 12 }
    }
}

pub struct ScbUart {
    registers: Registers,
}

impl ScbUart {
    /// # Safety
    ///
    /// Unsafe, duh!
    pub const unsafe fn new(base_addr: usize) -> ScbUart {
        ScbUart {
            registers: Registers::new(base_addr),
        }
    }

    /// Configure 8N1 with FIFOs and enable the block.
    pub fn prepare(&self, config: UartConfig) -> Result<()> {
        if !(8..=16).contains(&config.oversample) {
            return Err(UartError::InvalidOversample {
                oversample: config.oversample,
            });
        }

        // Turn off the block while reconfiguring
        self.registers.CTRL.set(0);

        self.registers
            .CTRL
            .write(CTRL::OVS.val(u32::from(config.oversample) - 1) + CTRL::MODE::Uart);
        self.registers.UART_CTRL.write(UART_CTRL::MODE::Standard);
        self.registers.UART_TX_CTRL.write(UART_FRAME::STOP_BITS::One);
        self.registers.UART_RX_CTRL.write(UART_FRAME::STOP_BITS::One);
        self.registers.TX_CTRL.write(DATA_CTRL::DATA_WIDTH.val(7));
        self.registers.RX_CTRL.write(DATA_CTRL::DATA_WIDTH.val(7));

        // Drop anything left in the FIFOs
        self.registers.TX_FIFO_CTRL.write(FIFO_CTRL::CLEAR::SET);
        self.registers.TX_FIFO_CTRL.set(0);
        self.registers.RX_FIFO_CTRL.write(FIFO_CTRL::CLEAR::SET);
        self.registers.RX_FIFO_CTRL.set(0);

        self.registers.CTRL.modify(CTRL::ENABLED::SET);
        Ok(())
    }

    fn tx_used(&self) -> u32 {
        self.registers.TX_FIFO_STATUS.read(FIFO_STATUS::USED)
    }
}

impl SerialOps for ScbUart {
    fn write_byte(&self, b: u8) {
        // wait until we can send
        loop_while(|| self.tx_used() >= FIFO_DEPTH);

        self.registers.TX_FIFO_WR.set(u32::from(b));
    }

    /// Wait until the TX FIFO is empty and the last frame has been shifted out.
    fn flush(&self) {
        loop_while(|| {
            self.tx_used() > 0 || self.registers.TX_FIFO_STATUS.is_set(FIFO_STATUS::SR_VALID)
        });
    }
}

impl interface::ConsoleOps for ScbUart {}

impl interface::Write for ScbUart {
    fn write_fmt(&self, args: fmt::Arguments) -> fmt::Result {
        fmt::Write::write_fmt(&mut ConsoleWriter(self), args)
    }
}

impl interface::All for ScbUart {}

#[cfg(test)]
mod tests {
    use {super::*, crate::console::interface::Write};

    fn uart(reg: &mut [u32; 256]) -> ScbUart {
        unsafe { ScbUart::new(reg as *mut _ as usize) }
    }

    #[test]
    fn prepare_sets_up_8n1_and_enables() {
        let mut reg = [0u32; 256];
        reg[0x204 / 4] = 0x7;
        let uart = uart(&mut reg);

        uart.prepare(UartConfig::default()).unwrap();
        assert_eq!(reg[0], (1 << 31) | (2 << 24) | 11); // CTRL
        assert_eq!(reg[0x044 / 4], 1); // one stop bit, no parity
        assert_eq!(reg[0x200 / 4], 7); // 8 data bits, LSB first
        assert_eq!(reg[0x300 / 4], 7);
        assert_eq!(reg[0x204 / 4], 0);
    }

    #[test]
    fn oversample_out_of_range_is_refused() {
        let mut reg = [0u32; 256];
        let uart = uart(&mut reg);

        assert_eq!(
            uart.prepare(UartConfig { oversample: 17 }),
            Err(UartError::InvalidOversample { oversample: 17 })
        );
        assert_eq!(reg[0], 0);
    }

    #[test]
    fn console_output_goes_to_the_tx_fifo() {
        let mut reg = [0u32; 256];
        let uart = uart(&mut reg);

        uart.write_fmt(format_args!("{:X}\n", 0xAu8)).unwrap();
        // Each byte overwrites the write register; CRLF ends the line.
        assert_eq!(reg[0x240 / 4], u32::from(b'\n'));
    }

    #[test]
    fn flush_returns_once_the_transmitter_is_idle() {
        let mut reg = [0u32; 256];
        let uart = uart(&mut reg);

        uart.write_byte(b'A');
        uart.flush();
        assert_eq!(reg[0x240 / 4], u32::from(b'A'));
    }
}
