/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Hosted run against the simulated supervisor.
//!
//! Every line read from stdin counts as one press of USER1. The button
//! "interrupt" is raised from a reader thread through the same latch the
//! firmware's handler uses.

use {
    machine::{
        console::{self, interface, ConsoleWriter},
        devices::SerialOps,
        println,
        sim::SimSupervisor,
        syscall::{DispatchConfig, Dispatcher, RequestLatch, ScratchBuffer},
    },
    std::{
        fmt,
        io::{self, BufRead, Write as _},
        process, thread,
        time::Duration,
    },
};

/// Lock polls the simulated supervisor takes per call.
const SUPERVISOR_BUSY_POLLS: u32 = 10_000;

struct StdoutConsole;

impl SerialOps for StdoutConsole {
    fn write_byte(&self, byte: u8) {
        let _ = io::stdout().write_all(&[byte]);
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

impl interface::ConsoleOps for StdoutConsole {
    /// The terminal wants plain newlines.
    fn write_string(&self, string: &str) {
        let _ = io::stdout().write_all(string.as_bytes());
    }
}

impl interface::Write for StdoutConsole {
    fn write_fmt(&self, args: fmt::Arguments) -> fmt::Result {
        fmt::Write::write_fmt(&mut ConsoleWriter(self), args)?;
        SerialOps::flush(self);
        Ok(())
    }
}

impl interface::All for StdoutConsole {}

static STDOUT_CONSOLE: StdoutConsole = StdoutConsole;
static BUTTON_LATCH: RequestLatch = RequestLatch::new();
static SCRATCH: ScratchBuffer = ScratchBuffer::new();

pub fn main() {
    console::register_console(&STDOUT_CONSOLE);

    thread::spawn(|| {
        for line in io::stdin().lock().lines() {
            if line.is_err() {
                break;
            }
            BUTTON_LATCH.signal();
        }
    });

    let supervisor = SimSupervisor::new().busy_polls(SUPERVISOR_BUSY_POLLS);
    let mut dispatcher = Dispatcher::new(
        &supervisor,
        &supervisor,
        &SCRATCH,
        DispatchConfig::default(),
    );
    let error = dispatcher.run(&BUTTON_LATCH, crate::PROMPT, || {
        thread::sleep(Duration::from_millis(10))
    });

    println!("\n[!] {}", error);
    process::exit(1);
}
