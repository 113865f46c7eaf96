/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Hand-off of button presses from the interrupt handler to the main loop.

use {
    super::interface::EdgeAck,
    core::sync::atomic::{AtomicBool, AtomicU8, Ordering},
};

/// Which system call a press asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Erase,
    Hash,
}

impl RequestKind {
    /// Odd press counts select erase, even ones hash, so the first press erases.
    pub fn from_press_count(presses: u8) -> Self {
        if presses % 2 == 1 {
            RequestKind::Erase
        } else {
            RequestKind::Hash
        }
    }
}

/// Single-producer (interrupt) / single-consumer (main loop) request flag with
/// a press counter.
///
/// Presses arriving while a call is in flight are folded into one pending
/// request; the counter keeps counting, so the parity of the latest press
/// decides what is served next.
pub struct RequestLatch {
    pending: AtomicBool,
    presses: AtomicU8,
}

impl RequestLatch {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            presses: AtomicU8::new(0),
        }
    }

    /// Record a press. Interrupt-safe: never blocks, never prints.
    pub fn signal(&self) {
        // The count must be visible before the flag that publishes it.
        self.presses.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    /// Consume the pending request, if any.
    pub fn take(&self) -> Option<RequestKind> {
        if !self.pending.swap(false, Ordering::Acquire) {
            return None;
        }
        Some(RequestKind::from_press_count(
            self.presses.load(Ordering::Relaxed),
        ))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Total presses seen, wrapping at 256.
    pub fn presses(&self) -> u8 {
        self.presses.load(Ordering::Relaxed)
    }
}

impl Default for RequestLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of the button interrupt handler.
///
/// The edge must be acknowledged before anything else, otherwise the handler
/// re-enters as soon as it returns.
pub fn on_edge(source: &impl EdgeAck, latch: &RequestLatch) {
    source.acknowledge();
    latch.signal();
}
