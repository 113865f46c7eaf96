/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Evaluation board wiring and bring-up of everything the demo uses.

use {
    super::{
        flashc::WorkFlashController,
        gpio::{Edge, GpioError, PinInterrupt, Port},
        ipc::{Ipc, IpcStruct},
        map,
        scb_uart::{ScbUart, UartConfig, UartError},
        sysint::{InterruptMux, SysIntError, SystemInterrupt},
    },
    crate::syscall::{
        latch, DispatchConfig, Dispatcher, IpcError, IpcNotify, RequestLatch, ScratchBuffer,
    },
    snafu::{ResultExt, Snafu},
};

/// USER1 switch, active low.
pub const USER_BUTTON_PORT: usize = 7;
pub const USER_BUTTON_PIN: usize = 0;

/// System interrupt of GPIO port 0; ports follow consecutively.
const GPIO_PORT_INTERRUPT_BASE: u16 = 21;

pub const USER_BUTTON_IRQ: SystemInterrupt = SystemInterrupt {
    source: GPIO_PORT_INTERRUPT_BASE + USER_BUTTON_PORT as u16,
    cpu_irq: 3,
    priority: 7,
};

/// IPC structure CM7 uses for system calls.
pub const SYSCALL_IPC_CHANNEL: usize = 1;
/// IPC interrupt structure serviced by the supervisor (CM0+).
pub const SYSCALL_NOTIFY: IpcNotify = IpcNotify::STRUCT_0;

pub const DEBUG_UART_SCB: usize = 0;

pub static BUTTON_LATCH: RequestLatch = RequestLatch::new();
pub static INTERRUPT_MUX: InterruptMux = unsafe { InterruptMux::cm7_0() };
pub static DEBUG_UART: ScbUart = unsafe { ScbUart::new(map::scb(DEBUG_UART_SCB)) };
pub static SCRATCH: ScratchBuffer = ScratchBuffer::new();

static USER_BUTTON: PinInterrupt =
    unsafe { PinInterrupt::new(map::gpio_port(USER_BUTTON_PORT), USER_BUTTON_PIN) };

fn user_button_handler() {
    latch::on_edge(&USER_BUTTON, &BUTTON_LATCH);
}

#[derive(Debug, Snafu)]
pub enum BoardError {
    #[snafu(display("user button setup failed: {}", source))]
    Button { source: GpioError },
    #[snafu(display("user button interrupt setup failed: {}", source))]
    Interrupt { source: SysIntError },
    #[snafu(display("debug UART setup failed: {}", source))]
    Uart { source: UartError },
    #[snafu(display("system call IPC channel unavailable: {}", source))]
    Ipc { source: IpcError },
}

pub type Result<T> = ::core::result::Result<T, BoardError>;

/// Peripherals the system call dispatcher drives.
pub struct Board {
    pub ipc: IpcStruct,
    pub flash: WorkFlashController,
}

impl Board {
    /// The dispatcher owning [`SCRATCH`]. Create only one.
    pub fn dispatcher(&self) -> Dispatcher<'static, &IpcStruct, &WorkFlashController> {
        let config = DispatchConfig {
            notify: SYSCALL_NOTIFY,
            ..DispatchConfig::default()
        };
        Dispatcher::new(&self.ipc, &self.flash, &SCRATCH, config)
    }
}

/// Bring up the debug console and the user button interrupt.
///
/// # Safety
///
/// Call once, on CM7_0, before interrupts are enabled.
pub unsafe fn init() -> Result<Board> {
    #[cfg(not(feature = "noserial"))]
    {
        DEBUG_UART.prepare(UartConfig::default()).context(UartSnafu)?;
        crate::console::register_console(&DEBUG_UART);
    }

    let port = Port::new(
        map::gpio_port(USER_BUTTON_PORT),
        map::hsiom_port(USER_BUTTON_PORT),
    );
    let button = port
        .pin(USER_BUTTON_PIN)
        .context(ButtonSnafu)?
        .into_pull_up_input();
    button.set_interrupt_edge(Edge::Falling);
    button.set_interrupt_mask(true);

    INTERRUPT_MUX
        .init(&USER_BUTTON_IRQ, user_button_handler)
        .context(InterruptSnafu)?;
    INTERRUPT_MUX.enable_cpu_irq(&USER_BUTTON_IRQ);

    let ipc = Ipc::default()
        .channel(SYSCALL_IPC_CHANNEL)
        .context(IpcSnafu)?;

    info!(
        "USER1 on P{}.{}, system interrupt {} on CPU IRQ {}",
        USER_BUTTON_PORT,
        USER_BUTTON_PIN,
        USER_BUTTON_IRQ.source,
        USER_BUTTON_IRQ.cpu_irq
    );

    Ok(Board {
        ipc,
        flash: WorkFlashController::default(),
    })
}
