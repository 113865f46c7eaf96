/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 */

//! Status word returned by the supervisor in scratch word 0.

use bit_field::BitField;

/// Status code of a successfully executed system call.
pub const STATUS_SUCCESS: u32 = 0xA;

/// Whole status word written when the HSM refuses to supervise the call.
pub const HSM_SUPERVISION_ERROR: u32 = 0x1122_3344;

/// Status code in the top nibble of the status word.
pub fn status_code(word: u32) -> u32 {
    word.get_bits(28..32)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Success,
    /// The HSM did not approve the call.
    Rejected,
    /// Any other status, carrying the raw status word.
    Failed(u32),
}

impl Verdict {
    pub fn decode(word: u32) -> Self {
        if status_code(word) == STATUS_SUCCESS {
            Verdict::Success
        } else if word == HSM_SUPERVISION_ERROR {
            Verdict::Rejected
        } else {
            Verdict::Failed(word)
        }
    }
}
