/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Primary bootloader decision sequence.
//!
//! 1. Promote a new secondary bootloader from staging, consume staging.
//! 2. Record a staged application as `Staged` for boot-sec.
//! 3. Hand off to the active secondary bootloader if it is authentic.
//! 4. Otherwise halt.

use embedded_hal::digital::StatefulOutputPin;

use super::{BootDecision, Indicators, StagingAction};
use crate::boot_flag::BootFlagManager;
use crate::flash::FlashWriter;
use crate::image::{Candidate, ImageManager};
use crate::log;
use crate::types::boot_state::BootState;
use crate::types::flash_layout::PartitionMap;
use crate::types::std_crc::Checksum;

/// Staging action for a classified secondary bootloader candidate.
pub const fn boot_sec_action(candidate: Candidate) -> StagingAction {
    match candidate {
        Candidate::New => StagingAction::Promote,
        Candidate::Unchanged | Candidate::Corrupt | Candidate::Residue => StagingAction::Discard,
        Candidate::Empty => StagingAction::Keep,
    }
}

pub struct BootPrim<'a, F: FlashWriter, C: Checksum, P: StatefulOutputPin> {
    flash: &'a mut F,
    crc: &'a mut C,
    leds: &'a mut Indicators<P>,
    map: &'a PartitionMap,
}

impl<'a, F: FlashWriter, C: Checksum, P: StatefulOutputPin> BootPrim<'a, F, C, P> {
    pub fn new(
        flash: &'a mut F,
        crc: &'a mut C,
        leds: &'a mut Indicators<P>,
        map: &'a PartitionMap,
    ) -> Self {
        Self {
            flash,
            crc,
            leds,
            map,
        }
    }

    pub fn run(&mut self) -> BootDecision {
        log::info!("boot-prim");

        self.update_boot_sec();
        self.record_staged_app();
        self.select_boot_sec()
    }

    fn images(&mut self) -> ImageManager<'_, F, C> {
        ImageManager::new(self.flash, self.crc)
    }

    fn update_boot_sec(&mut self) {
        let active = self.map.boot_sec;
        let staged = self.map.new_boot_sec;

        let candidate = self.images().classify(&active, &staged);
        let action = boot_sec_action(candidate);
        log::info!("boot-sec candidate {} -> {}", candidate, action);

        if action == StagingAction::Promote {
            let copied = self
                .images()
                .write_image(staged.start(), active.start(), active.size());
            if let Err(e) = copied {
                // staging stays, the next power-up retries the promotion
                log::error!("boot-sec promotion failed: {}", e);
                self.leds.raise_fault();
                return;
            }
            self.leds.toggle_promoted();
        }

        if action != StagingAction::Keep {
            let cleared = self.images().clear_image(staged.start(), staged.size());
            if let Err(e) = cleared {
                log::error!("boot-sec staging not cleared: {}", e);
                self.leds.raise_fault();
            }
        }
    }

    fn record_staged_app(&mut self) {
        let metadata = self.map.new_app.metadata();
        if !self.images().is_image_staged(metadata) {
            return;
        }

        let mut flags = BootFlagManager::new(&mut *self.flash);
        if flags.get_state() != BootState::Staged {
            if let Err(e) = flags.set_state(BootState::Staged) {
                log::error!("staged flag not persisted: {}", e);
                self.leds.raise_fault();
            }
        }
        self.leds.toggle_staged();
    }

    fn select_boot_sec(&mut self) -> BootDecision {
        let active = self.map.boot_sec;
        if self.images().is_image_authentic(active.start(), active.metadata()) {
            log::info!("handing off to boot-sec at {:#x}", active.start());
            BootDecision::HandOff(active.start())
        } else {
            log::error!("no authentic boot-sec, halting");
            BootDecision::Halt
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_actions_per_candidate() {
        let table = [
            (Candidate::Empty, StagingAction::Keep),
            (Candidate::Residue, StagingAction::Discard),
            (Candidate::Corrupt, StagingAction::Discard),
            (Candidate::Unchanged, StagingAction::Discard),
            (Candidate::New, StagingAction::Promote),
        ];
        for (candidate, action) in table {
            assert_eq!(boot_sec_action(candidate), action, "{candidate:?}");
        }
    }
}
