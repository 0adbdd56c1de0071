/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use super::ERASED_WORD;

const IDLE: u32 = 0x4944_4C45;
const STAGED: u32 = 0x5354_4147;
const VERIFIED: u32 = 0x5645_5249;
const APPLIED: u32 = 0x4150_504C;
const FAILED: u32 = 0x4641_494C;

/// Persisted update lifecycle, one 32-bit word in the config sector.
///
/// Each value reads as four ASCII characters when the word is dumped
/// most significant byte first, so the state is readable in a raw flash
/// dump.
///
/// | State    | Word          | ASCII  |
/// |----------|---------------|--------|
/// | Blank    | `0xFFFF_FFFF` | erased |
/// | Idle     | `0x4944_4C45` | `IDLE` |
/// | Staged   | `0x5354_4147` | `STAG` |
/// | Verified | `0x5645_5249` | `VERI` |
/// | Applied  | `0x4150_504C` | `APPL` |
/// | Failed   | `0x4641_494C` | `FAIL` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum BootState {
    /// Erased config sector, never written since the last erase
    Blank = ERASED_WORD,
    /// No update activity, explicitly cleared
    Idle = IDLE,
    /// boot-prim found an application candidate in staging
    Staged = STAGED,
    /// Reserved for a signature verification step, never written today
    Verified = VERIFIED,
    /// boot-sec promoted the staged application
    Applied = APPLIED,
    /// The staged application was present but failed its integrity check
    Failed = FAILED,
}

impl BootState {
    pub const ALL: [BootState; 6] = [
        Self::Blank,
        Self::Idle,
        Self::Staged,
        Self::Verified,
        Self::Applied,
        Self::Failed,
    ];

    /// Decodes a raw config word. Anything outside the enumeration is
    /// treated as [`BootState::Blank`].
    pub const fn from_word(word: u32) -> Self {
        match word {
            IDLE => Self::Idle,
            STAGED => Self::Staged,
            VERIFIED => Self::Verified,
            APPLIED => Self::Applied,
            FAILED => Self::Failed,
            _ => Self::Blank,
        }
    }

    pub const fn to_word(self) -> u32 {
        self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_spell_their_state() {
        assert_eq!(&BootState::Idle.to_word().to_be_bytes(), b"IDLE");
        assert_eq!(&BootState::Staged.to_word().to_be_bytes(), b"STAG");
        assert_eq!(&BootState::Verified.to_word().to_be_bytes(), b"VERI");
        assert_eq!(&BootState::Applied.to_word().to_be_bytes(), b"APPL");
        assert_eq!(&BootState::Failed.to_word().to_be_bytes(), b"FAIL");
    }

    #[test]
    fn unknown_words_decode_as_blank() {
        assert_eq!(BootState::from_word(ERASED_WORD), BootState::Blank);
        assert_eq!(BootState::from_word(0), BootState::Blank);
        assert_eq!(BootState::from_word(0x5354_4146), BootState::Blank);
    }

    #[test]
    fn every_state_decodes_from_its_word() {
        for state in BootState::ALL {
            assert_eq!(BootState::from_word(state.to_word()), state);
        }
    }
}
