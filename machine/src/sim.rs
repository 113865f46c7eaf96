/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! A stand-in for the supervisor core, for tests and the hosted build.
//!
//! It plays both ends CM7 talks to: the IPC channel, whose lock it holds while
//! a call "executes", and the work-flash write gate. Responses are written into
//! the scratch buffer whose address arrived with the message.

use {
    crate::syscall::{
        interface::{IpcChannel, WorkFlash},
        opcode,
        status::HSM_SUPERVISION_ERROR,
        IpcError, IpcNotify,
    },
    std::{cell::RefCell, collections::VecDeque, ptr, vec::Vec},
};

/// How the supervisor answers one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// Execute and report success.
    Approve,
    /// HSM refuses to supervise the call.
    Reject,
    /// Finish with this status word.
    Fail(u32),
    /// Never release the lock.
    Hang,
}

/// Everything the simulated supervisor observed or did, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    WriteEnable,
    WriteDisable,
    Send {
        opcode: u32,
        parameter: u32,
        write_enabled: bool,
    },
    SendRefused,
    Released {
        status_word: u32,
    },
}

struct InFlight {
    buffer: *mut u32,
    opcode: u32,
    response: Response,
    polls_left: u32,
}

struct State {
    script: VecDeque<Response>,
    fallback: Response,
    hash: [u32; 4],
    busy_polls: u32,
    refuse_sends: bool,
    write_enabled: bool,
    in_flight: Option<InFlight>,
    events: Vec<Event>,
}

pub struct SimSupervisor {
    state: RefCell<State>,
}

impl SimSupervisor {
    pub const DEFAULT_HASH: [u32; 4] = [0x5a5a_0001, 0x5a5a_0002, 0x5a5a_0003, 0x5a5a_0004];

    /// A supervisor approving every call on the first lock poll.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                script: VecDeque::new(),
                fallback: Response::Approve,
                hash: Self::DEFAULT_HASH,
                busy_polls: 0,
                refuse_sends: false,
                write_enabled: false,
                in_flight: None,
                events: Vec::new(),
            }),
        }
    }

    /// Answer the next calls in this order, then fall back to approving.
    pub fn with_script(self, script: impl IntoIterator<Item = Response>) -> Self {
        self.state.borrow_mut().script.extend(script);
        self
    }

    pub fn with_hash(self, hash: [u32; 4]) -> Self {
        self.state.borrow_mut().hash = hash;
        self
    }

    /// Keep the lock for this many polls before answering.
    pub fn busy_polls(self, polls: u32) -> Self {
        self.state.borrow_mut().busy_polls = polls;
        self
    }

    /// Fail every send as if another master held the IPC lock.
    pub fn refuse_sends(self) -> Self {
        self.state.borrow_mut().refuse_sends = true;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// Messages accepted so far.
    pub fn sends(&self) -> usize {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|event| matches!(event, Event::Send { .. }))
            .count()
    }

    /// Finish the call in flight with `response` on the next lock poll.
    pub fn complete_with(&self, response: Response) {
        if let Some(call) = self.state.borrow_mut().in_flight.as_mut() {
            call.response = response;
            call.polls_left = 0;
        }
    }

    fn complete(state: &mut State, call: InFlight) {
        let status_word = match call.response {
            Response::Approve => 0xA000_0000,
            Response::Reject => HSM_SUPERVISION_ERROR,
            Response::Fail(word) => word,
            Response::Hang => return,
        };
        // SAFETY: the buffer was handed over with the message and is not
        // touched by its owner until the lock is seen released.
        unsafe {
            ptr::write_volatile(call.buffer, status_word);
            if call.response == Response::Approve && call.opcode == opcode::GENERATE_HASH_FACTORY {
                for (index, word) in state.hash.iter().enumerate() {
                    ptr::write_volatile(call.buffer.add(index + 1), *word);
                }
                ptr::write_volatile(call.buffer.add(5), 0);
            }
        }
        state.events.push(Event::Released { status_word });
    }
}

impl Default for SimSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl IpcChannel for SimSupervisor {
    fn send_message(&self, _notify: IpcNotify, payload: usize) -> Result<(), IpcError> {
        let mut state = self.state.borrow_mut();
        if state.refuse_sends || state.in_flight.is_some() {
            state.events.push(Event::SendRefused);
            return Err(IpcError::LockUnavailable);
        }

        let buffer = payload as *mut u32;
        // SAFETY: the payload is the address of a scratch buffer of at least
        // two words owned by this side for the duration of the call.
        let (opcode, parameter) =
            unsafe { (ptr::read_volatile(buffer), ptr::read_volatile(buffer.add(1))) };
        let write_enabled = state.write_enabled;
        state.events.push(Event::Send {
            opcode,
            parameter,
            write_enabled,
        });

        let response = state.script.pop_front().unwrap_or(state.fallback);
        state.in_flight = Some(InFlight {
            buffer,
            opcode,
            response,
            polls_left: state.busy_polls,
        });
        Ok(())
    }

    fn is_lock_acquired(&self) -> bool {
        let mut state = self.state.borrow_mut();
        let call = match state.in_flight.as_mut() {
            Some(call) => call,
            None => return false,
        };
        if call.polls_left > 0 {
            call.polls_left -= 1;
            return true;
        }
        if call.response == Response::Hang {
            return true;
        }
        if let Some(call) = state.in_flight.take() {
            Self::complete(&mut state, call);
        }
        false
    }
}

impl WorkFlash for SimSupervisor {
    fn write_enable(&self) {
        let mut state = self.state.borrow_mut();
        state.write_enabled = true;
        state.events.push(Event::WriteEnable);
    }

    fn write_disable(&self) {
        let mut state = self.state.borrow_mut();
        state.write_enabled = false;
        state.events.push(Event::WriteDisable);
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::syscall::ScratchBuffer};

    #[test]
    fn lock_is_held_while_busy_then_released_with_a_result() {
        let sim = SimSupervisor::new().busy_polls(2);
        let scratch = ScratchBuffer::new();
        unsafe { ptr::write_volatile(scratch.as_ptr(), opcode::ERASE_SECTOR_BLOCKING) };

        sim.send_message(IpcNotify::STRUCT_0, scratch.as_ptr() as usize)
            .unwrap();
        assert!(sim.is_lock_acquired());
        assert!(sim.is_lock_acquired());
        assert!(!sim.is_lock_acquired());
        assert_eq!(unsafe { ptr::read_volatile(scratch.as_ptr()) }, 0xA000_0000);
        assert!(!sim.is_lock_acquired());
    }

    #[test]
    fn second_send_while_locked_is_refused() {
        let sim = SimSupervisor::new().with_script([Response::Hang]);
        let scratch = ScratchBuffer::new();
        let address = scratch.as_ptr() as usize;

        assert_eq!(sim.send_message(IpcNotify::STRUCT_0, address), Ok(()));
        assert_eq!(
            sim.send_message(IpcNotify::STRUCT_0, address),
            Err(IpcError::LockUnavailable)
        );
        assert_eq!(sim.sends(), 1);
        assert_eq!(sim.events().last(), Some(&Event::SendRefused));
    }

    #[test]
    fn hung_call_can_be_completed_later() {
        let sim = SimSupervisor::new().with_script([Response::Hang]);
        let scratch = ScratchBuffer::new();
        sim.send_message(IpcNotify::STRUCT_0, scratch.as_ptr() as usize)
            .unwrap();
        for _ in 0..100 {
            assert!(sim.is_lock_acquired());
        }
        sim.complete_with(Response::Reject);
        assert!(!sim.is_lock_acquired());
        assert_eq!(
            sim.events().last(),
            Some(&Event::Released {
                status_word: HSM_SUPERVISION_ERROR
            })
        );
    }
}
