/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Turns pending button presses into system calls and reports their outcome.

use {
    super::{
        buffer::{BufferError, Owner, ScratchBuffer, SharedBuffer},
        interface::{IpcChannel, WorkFlash},
        latch::{RequestKind, RequestLatch},
        report::{FactoryHash, Outcome, Report},
        status::Verdict,
        IpcError, IpcNotify, SystemCall, WORK_FLASH_FIRST_LARGE_SECTOR,
    },
    snafu::{ResultExt, Snafu},
};

/// Lock polls before a system call is given up on.
pub const DEFAULT_LOCK_POLL_LIMIT: u32 = 1 << 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    /// IPC interrupt structures rung for every call.
    pub notify: IpcNotify,
    /// Sector erased by the erase call.
    pub erase_sector: u32,
    /// `None` waits for the supervisor forever.
    pub lock_poll_limit: Option<u32>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            notify: IpcNotify::STRUCT_0,
            erase_sector: WORK_FLASH_FIRST_LARGE_SECTOR,
            lock_poll_limit: Some(DEFAULT_LOCK_POLL_LIMIT),
        }
    }
}

/// Conditions the dispatcher cannot recover from.
#[derive(Snafu, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    #[snafu(display("system call could not be sent: {}", source))]
    Mailbox { source: IpcError },
    #[snafu(display("scratch buffer used out of turn: {}", source))]
    Ownership { source: BufferError },
}

pub type Result<T> = core::result::Result<T, DispatchError>;

/// Issues system calls over one IPC channel, one at a time.
pub struct Dispatcher<'a, C, F> {
    channel: C,
    flash: F,
    buffer: SharedBuffer<'a>,
    config: DispatchConfig,
}

impl<'a, C: IpcChannel, F: WorkFlash> Dispatcher<'a, C, F> {
    pub fn new(channel: C, flash: F, scratch: &'a ScratchBuffer, config: DispatchConfig) -> Self {
        Self {
            channel,
            flash,
            buffer: SharedBuffer::new(scratch),
            config,
        }
    }

    pub fn call_for(&self, kind: RequestKind) -> SystemCall {
        match kind {
            RequestKind::Erase => SystemCall::EraseSector {
                address: self.config.erase_sector,
            },
            RequestKind::Hash => SystemCall::FactoryHash,
        }
    }

    /// Serve the pending request, if there is one.
    pub fn service(&mut self, latch: &RequestLatch) -> Result<Option<Report>> {
        let kind = match latch.take() {
            Some(kind) => kind,
            None => return Ok(None),
        };
        let call = self.call_for(kind);
        println!("\n{}", call.banner());
        self.execute(call).map(Some)
    }

    /// Run one system call to completion, timeout or refusal.
    pub fn execute(&mut self, call: SystemCall) -> Result<Report> {
        if self.buffer.owner() == Owner::Remote {
            if self.channel.is_lock_acquired() {
                return Ok(Report {
                    call,
                    outcome: Outcome::Busy,
                });
            }
            self.buffer.reclaim();
            warn!("Late completion of a timed out system call discarded");
        }

        let writes_flash = call.writes_work_flash();
        if writes_flash {
            self.flash.write_enable();
        }
        let outcome = self.invoke(call);
        if writes_flash {
            self.flash.write_disable();
        }

        Ok(Report {
            call,
            outcome: outcome?,
        })
    }

    fn invoke(&mut self, call: SystemCall) -> Result<Outcome> {
        self.buffer
            .prepare(call.request().as_slice())
            .context(OwnershipSnafu)?;
        let address = self.buffer.hand_over().context(OwnershipSnafu)?;

        if let Err(source) = self.channel.send_message(self.config.notify, address) {
            // Nothing was handed over.
            self.buffer.reclaim();
            return Err(DispatchError::Mailbox { source });
        }

        if let Err(polls) = self.await_release() {
            return Ok(Outcome::TimedOut { polls });
        }
        self.buffer.reclaim();

        self.collect(call)
    }

    /// Poll the IPC lock until the supervisor releases it.
    ///
    /// Returns the number of polls made when the limit runs out first.
    fn await_release(&self) -> core::result::Result<(), u32> {
        let mut count: u32 = 0;
        while self.channel.is_lock_acquired() {
            count = count.saturating_add(1);
            if let Some(limit) = self.config.lock_poll_limit {
                if count >= limit {
                    return Err(count);
                }
            }
        }
        Ok(())
    }

    fn collect(&self, call: SystemCall) -> Result<Outcome> {
        let status_word = self.buffer.word(0).context(OwnershipSnafu)?;
        Ok(match Verdict::decode(status_word) {
            Verdict::Success => match call {
                SystemCall::EraseSector { .. } => Outcome::Erased,
                SystemCall::FactoryHash => Outcome::Hashed(self.factory_hash()?),
            },
            Verdict::Rejected => Outcome::Rejected,
            Verdict::Failed(status_word) => Outcome::Failed { status_word },
        })
    }

    fn factory_hash(&self) -> Result<FactoryHash> {
        let mut words = [0u32; 4];
        for (index, word) in words.iter_mut().enumerate() {
            *word = self.buffer.word(index + 1).context(OwnershipSnafu)?;
        }
        let zeros = self.buffer.word(5).context(OwnershipSnafu)?;
        Ok(FactoryHash { words, zeros })
    }

    /// Serve button presses forever.
    ///
    /// `idle` runs whenever nothing is pending. Returns only on a fatal error.
    pub fn run(&mut self, latch: &RequestLatch, prompt: &str, mut idle: impl FnMut()) -> DispatchError {
        println!("\n{}", prompt);
        loop {
            match self.service(latch) {
                Ok(Some(report)) => {
                    println!("\n{}", report);
                    println!("\n{}", prompt);
                }
                Ok(None) => idle(),
                Err(error) => return error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            sim::{Event, Response, SimSupervisor},
            syscall::{opcode, status::HSM_SUPERVISION_ERROR},
        },
    };

    const HASH: [u32; 4] = [0x0123_4567, 0x89ab_cdef, 0xfeed_f00d, 0x0bad_cafe];

    fn config(limit: Option<u32>) -> DispatchConfig {
        DispatchConfig {
            lock_poll_limit: limit,
            ..DispatchConfig::default()
        }
    }

    fn press(latch: &RequestLatch, dispatcher: &mut Dispatcher<&SimSupervisor, &SimSupervisor>) -> Report {
        latch.signal();
        dispatcher.service(latch).unwrap().unwrap()
    }

    #[test]
    fn default_config_matches_the_board() {
        let config = DispatchConfig::default();
        assert_eq!(config.notify.bits(), 1 << 0);
        assert_eq!(config.erase_sector, 0x1400_0000);
        assert_eq!(config.lock_poll_limit, Some(1 << 25));
    }

    #[test]
    fn idle_when_nothing_is_pending() {
        let sim = SimSupervisor::new();
        let scratch = ScratchBuffer::new();
        let latch = RequestLatch::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(None));
        assert_eq!(dispatcher.service(&latch), Ok(None));
        assert!(sim.events().is_empty());
    }

    #[test]
    fn presses_alternate_with_one_send_each() {
        let sim = SimSupervisor::new().with_hash(HASH);
        let scratch = ScratchBuffer::new();
        let latch = RequestLatch::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(Some(100)));

        for n in 1..=6 {
            let report = press(&latch, &mut dispatcher);
            let expected = if n % 2 == 1 {
                Outcome::Erased
            } else {
                Outcome::Hashed(FactoryHash {
                    words: HASH,
                    zeros: 0,
                })
            };
            assert_eq!(report.outcome, expected);
            assert_eq!(sim.sends(), n);
        }
        assert!(!sim.events().contains(&Event::SendRefused));
    }

    #[test]
    fn erase_is_bracketed_by_write_access() {
        let sim = SimSupervisor::new().busy_polls(3);
        let scratch = ScratchBuffer::new();
        let latch = RequestLatch::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(Some(100)));

        let report = press(&latch, &mut dispatcher);
        assert_eq!(
            report.call,
            SystemCall::EraseSector {
                address: WORK_FLASH_FIRST_LARGE_SECTOR
            }
        );
        assert_eq!(
            sim.events(),
            [
                Event::WriteEnable,
                Event::Send {
                    opcode: opcode::ERASE_SECTOR_BLOCKING,
                    parameter: WORK_FLASH_FIRST_LARGE_SECTOR,
                    write_enabled: true,
                },
                Event::Released {
                    status_word: 0xA000_0000
                },
                Event::WriteDisable,
            ]
        );
    }

    #[test]
    fn hash_never_touches_write_access() {
        let sim = SimSupervisor::new();
        let scratch = ScratchBuffer::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(None));

        dispatcher.execute(SystemCall::FactoryHash).unwrap();
        let events = sim.events();
        assert!(!events.contains(&Event::WriteEnable));
        assert!(!events.contains(&Event::WriteDisable));
        assert!(matches!(
            events[0],
            Event::Send {
                opcode: opcode::GENERATE_HASH_FACTORY,
                write_enabled: false,
                ..
            }
        ));
    }

    #[test]
    fn rejection_sentinel_wins_over_the_status_nibble() {
        let sim = SimSupervisor::new().with_script([Response::Reject, Response::Reject]);
        let scratch = ScratchBuffer::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(None));

        let erase = dispatcher.call_for(RequestKind::Erase);
        assert_eq!(dispatcher.execute(erase).unwrap().outcome, Outcome::Rejected);
        // Write access is closed again after a rejected erase.
        assert_eq!(sim.events().last(), Some(&Event::WriteDisable));

        assert_eq!(
            dispatcher.execute(SystemCall::FactoryHash).unwrap().outcome,
            Outcome::Rejected
        );
        assert_eq!(
            sim.events().last(),
            Some(&Event::Released {
                status_word: HSM_SUPERVISION_ERROR
            })
        );
        assert_eq!(
            sim.events()
                .iter()
                .filter(|event| **event == Event::WriteDisable)
                .count(),
            1
        );
    }

    #[test]
    fn other_status_words_are_reported_literally() {
        let sim = SimSupervisor::new().with_script([Response::Fail(0xF000_0007)]);
        let scratch = ScratchBuffer::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(None));

        let report = dispatcher.execute(SystemCall::FactoryHash).unwrap();
        assert_eq!(
            report.outcome,
            Outcome::Failed {
                status_word: 0xF000_0007
            }
        );
    }

    #[test]
    fn refused_send_is_fatal_and_closes_write_access() {
        let sim = SimSupervisor::new().refuse_sends();
        let scratch = ScratchBuffer::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(None));

        let erase = dispatcher.call_for(RequestKind::Erase);
        assert_eq!(
            dispatcher.execute(erase),
            Err(DispatchError::Mailbox {
                source: IpcError::LockUnavailable
            })
        );
        assert_eq!(
            sim.events(),
            [Event::WriteEnable, Event::SendRefused, Event::WriteDisable]
        );
        assert_eq!(dispatcher.buffer.owner(), Owner::Local);
    }

    #[test]
    fn hung_supervisor_times_out_then_reports_busy() {
        let sim = SimSupervisor::new().with_script([Response::Hang]);
        let scratch = ScratchBuffer::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(Some(16)));

        let erase = dispatcher.call_for(RequestKind::Erase);
        let report = dispatcher.execute(erase).unwrap();
        assert_eq!(report.outcome, Outcome::TimedOut { polls: 16 });
        assert_eq!(sim.events().last(), Some(&Event::WriteDisable));
        assert_eq!(dispatcher.buffer.owner(), Owner::Remote);

        let before = sim.events().len();
        let report = dispatcher.execute(erase).unwrap();
        assert_eq!(report.outcome, Outcome::Busy);
        // Neither the mailbox nor the flash gate was touched.
        assert_eq!(sim.events().len(), before);
        assert_eq!(sim.sends(), 1);
    }

    #[test]
    fn late_completion_is_discarded_and_the_next_call_proceeds() {
        let sim = SimSupervisor::new().with_script([Response::Hang, Response::Approve]);
        let scratch = ScratchBuffer::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(Some(4)));

        let report = dispatcher.execute(SystemCall::FactoryHash).unwrap();
        assert_eq!(report.outcome, Outcome::TimedOut { polls: 4 });

        sim.complete_with(Response::Fail(0x5000_0000));
        let erase = dispatcher.call_for(RequestKind::Erase);
        let report = dispatcher.execute(erase).unwrap();
        assert_eq!(report.outcome, Outcome::Erased);
        assert_eq!(sim.sends(), 2);
    }

    #[test]
    fn slow_supervisor_within_the_limit_completes() {
        let sim = SimSupervisor::new().busy_polls(9);
        let scratch = ScratchBuffer::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(Some(10)));
        assert_eq!(
            dispatcher.execute(SystemCall::FactoryHash).unwrap().outcome,
            Outcome::Hashed(FactoryHash {
                words: SimSupervisor::DEFAULT_HASH,
                zeros: 0,
            })
        );

        let sim = SimSupervisor::new().busy_polls(10);
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(Some(10)));
        assert_eq!(
            dispatcher.execute(SystemCall::FactoryHash).unwrap().outcome,
            Outcome::TimedOut { polls: 10 }
        );
    }

    #[test]
    fn hash_words_do_not_leak_into_a_following_erase() {
        let sim = SimSupervisor::new().with_hash(HASH);
        let scratch = ScratchBuffer::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(None));

        dispatcher.execute(SystemCall::FactoryHash).unwrap();
        let erase = dispatcher.call_for(RequestKind::Erase);
        dispatcher.execute(erase).unwrap();

        for index in 2..6 {
            assert_eq!(dispatcher.buffer.word(index), Ok(0));
        }
    }

    #[test]
    fn run_returns_the_fatal_error() {
        let sim = SimSupervisor::new().refuse_sends();
        let scratch = ScratchBuffer::new();
        let latch = RequestLatch::new();
        let mut dispatcher = Dispatcher::new(&sim, &sim, &scratch, config(None));

        let mut idled = 0;
        let error = dispatcher.run(&latch, "press", || {
            idled += 1;
            latch.signal();
        });
        assert_eq!(idled, 1);
        assert!(matches!(error, DispatchError::Mailbox { .. }));
    }
}
