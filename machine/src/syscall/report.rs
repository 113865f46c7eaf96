/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

use {super::SystemCall, core::fmt};

/// Factory hash as returned in scratch words 1..=5.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FactoryHash {
    pub words: [u32; 4],
    /// Expected to read zero, echoed as returned.
    pub zeros: u32,
}

/// What became of one system call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Erased,
    Hashed(FactoryHash),
    /// The HSM refused to supervise the call.
    Rejected,
    Failed { status_word: u32 },
    /// The supervisor did not release the IPC lock within the poll limit.
    TimedOut { polls: u32 },
    /// Not sent: a call that timed out earlier still holds the IPC lock.
    Busy,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Erased | Outcome::Hashed(_))
    }
}

/// Console report for one serviced button press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Report {
    pub call: SystemCall,
    pub outcome: Outcome,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = self.call.name();
        match self.outcome {
            Outcome::Erased => write!(f, "{} system call successfully executed", name),
            Outcome::Hashed(hash) => {
                writeln!(f, "{} system call successfully executed.", name)?;
                for (index, word) in hash.words.iter().enumerate() {
                    writeln!(f, "Factory Hash word {}: {:08X}", index, word)?;
                }
                write!(f, "Factory Hash zeros:  {:08X}", hash.zeros)
            }
            Outcome::Rejected => write!(f, "HSM did not approve the system call"),
            Outcome::Failed { status_word } => write!(
                f,
                "{} system call failed with error code {:08X}",
                name, status_word
            ),
            Outcome::TimedOut { polls } => write!(
                f,
                "{} system call timed out, IPC lock still held after {} polls",
                name, polls
            ),
            Outcome::Busy => write!(
                f,
                "{} system call not sent, previous system call still holds the IPC lock",
                name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::syscall::WORK_FLASH_FIRST_LARGE_SECTOR};

    const ERASE: SystemCall = SystemCall::EraseSector {
        address: WORK_FLASH_FIRST_LARGE_SECTOR,
    };

    #[test]
    fn hash_report_echoes_every_word() {
        let report = Report {
            call: SystemCall::FactoryHash,
            outcome: Outcome::Hashed(FactoryHash {
                words: [0x0123_4567, 0x89ab_cdef, 0xdead_beef, 0x0000_00ff],
                zeros: 0,
            }),
        };
        assert_eq!(
            format!("{}", report),
            "Generate Hash system call successfully executed.\n\
             Factory Hash word 0: 01234567\n\
             Factory Hash word 1: 89ABCDEF\n\
             Factory Hash word 2: DEADBEEF\n\
             Factory Hash word 3: 000000FF\n\
             Factory Hash zeros:  00000000"
        );
    }

    #[test]
    fn failure_report_carries_the_literal_status_word() {
        let report = Report {
            call: ERASE,
            outcome: Outcome::Failed {
                status_word: 0xF000_00A1,
            },
        };
        assert_eq!(
            format!("{}", report),
            "Work-flash erase sector system call failed with error code F00000A1"
        );
    }

    #[test]
    fn rejection_report_is_the_same_for_both_calls() {
        for call in [ERASE, SystemCall::FactoryHash] {
            let report = Report {
                call,
                outcome: Outcome::Rejected,
            };
            assert_eq!(format!("{}", report), "HSM did not approve the system call");
        }
    }

    #[test]
    fn only_completed_calls_count_as_success() {
        assert!(Outcome::Erased.is_success());
        assert!(!Outcome::Busy.is_success());
        assert!(!Outcome::TimedOut { polls: 1 }.is_success());
    }
}
