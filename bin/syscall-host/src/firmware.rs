/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

use {
    cortex_m_rt::{entry, exception, ExceptionFrame},
    machine::{arch, platform::traveo2::board},
};

#[entry]
fn main() -> ! {
    // The supervisor reads the scratch buffer from SRAM, bypassing this core's cache.
    arch::disable_data_cache();

    // SAFETY: runs once, before interrupts are enabled.
    let board = match unsafe { board::init() } {
        Ok(board) => board,
        Err(error) => panic!("Board bring-up failed: {}", error),
    };
    arch::enable_interrupts();

    let mut dispatcher = board.dispatcher();
    let error = dispatcher.run(&board::BUTTON_LATCH, crate::PROMPT, arch::nop);
    panic!("{}", error)
}

/// Every external interrupt lands here and is demultiplexed to its system interrupt handler.
#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    if let Ok(cpu_irq) = u16::try_from(irqn) {
        board::INTERRUPT_MUX.dispatch(cpu_irq);
    }
}

#[exception]
unsafe fn HardFault(frame: &ExceptionFrame) -> ! {
    panic!("HardFault at pc {:#010x}", frame.pc())
}

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    machine::panic::handler(info)
}
