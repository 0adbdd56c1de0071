/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Flash backed boot state shared by boot-prim and boot-sec.

use crate::flash::FlashWriter;
use crate::log;
use crate::types::boot_state::BootState;
use crate::types::flash_layout::{sector_from_address, PARTITION_MAP};
use crate::types::ERASED_WORD;
use crate::{Address, Error};

const FLAG_ADDR: Address = PARTITION_MAP.boot_flag();
const CONFIG_SECTOR: u8 = sector_from_address(FLAG_ADDR);

pub struct BootFlagManager<'a, F: FlashWriter> {
    writer: &'a mut F,
}

impl<'a, F: FlashWriter> BootFlagManager<'a, F> {
    pub fn new(writer: &'a mut F) -> Self {
        Self { writer }
    }

    /// Current persisted state. Unreadable or unknown words are
    /// [`BootState::Blank`], never [`BootState::Idle`].
    pub fn get_state(&mut self) -> BootState {
        match self.writer.read_word(FLAG_ADDR) {
            Ok(word) => BootState::from_word(word),
            Err(e) => {
                log::warn!("boot flag unreadable: {}", e);
                BootState::Blank
            }
        }
    }

    /// Erase the config sector, program `state`, read it back.
    ///
    /// Runs in one critical section. A readback mismatch is reported as
    /// [`Error::WriteVerification`] and not retried.
    pub fn set_state(&mut self, state: BootState) -> Result<(), Error> {
        let word = state.to_word();

        let result = critical_section::with(|_| {
            self.writer.unlock();
            let result = self.program(word);
            self.writer.lock();
            result
        });

        match result {
            Ok(()) => log::info!("boot state -> {}", state),
            Err(e) => log::error!("boot state {} not persisted: {}", state, e),
        }
        result
    }

    /// Same as `set_state(BootState::Idle)`.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.set_state(BootState::Idle)
    }

    fn program(&mut self, word: u32) -> Result<(), Error> {
        self.writer.erase_sector(CONFIG_SECTOR)?;
        if word != ERASED_WORD {
            self.writer.write_word(FLAG_ADDR, word)?;
        }

        let actual = self.writer.read_word(FLAG_ADDR)?;
        if actual != word {
            return Err(Error::WriteVerification {
                address: FLAG_ADDR,
                expected: word,
                actual,
            });
        }
        Ok(())
    }
}
