/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Secondary bootloader decision sequence.
//!
//! 1. Receive an update image into staging when the warm signal asks.
//! 2. Evaluate the staged application when `Staged` or just received.
//! 3. Otherwise sweep leftovers out of the application staging slot.
//! 4. Hand off to the active application if it is authentic, else halt.

use embedded_hal::digital::StatefulOutputPin;
use embedded_io::Read;

use super::{BootDecision, Indicators, StagingAction};
use crate::boot_flag::BootFlagManager;
use crate::flash::FlashWriter;
use crate::image::{Candidate, ImageManager};
use crate::log;
use crate::receiver::UartReceiver;
use crate::shared::{SharedWord, UpdateRequest, WarmSignal};
use crate::types::boot_state::BootState;
use crate::types::flash_layout::PartitionMap;
use crate::types::partition::UPDATE_IMAGE_SIZE;
use crate::types::std_crc::Checksum;
use crate::{Address, Error};

/// Outcome of evaluating the application staging slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppPlan {
    pub staging: StagingAction,
    /// State to persist, `None` leaves the flag untouched
    pub state: Option<BootState>,
    pub fault: bool,
}

impl AppPlan {
    const fn new(staging: StagingAction, state: Option<BootState>) -> Self {
        Self {
            staging,
            state,
            fault: false,
        }
    }
}

/// Transition table of the application staging slot.
///
/// `received` is true when this boot just finished a serial receive.
pub const fn app_plan(state: BootState, received: bool, candidate: Candidate) -> AppPlan {
    let staged = matches!(state, BootState::Staged);

    if !(staged || received) {
        return match candidate {
            Candidate::Empty => AppPlan::new(StagingAction::Keep, None),
            _ => AppPlan::new(StagingAction::Discard, None),
        };
    }

    // a consumed request that held nothing worth promoting goes back to idle
    let settle = if staged { Some(BootState::Idle) } else { None };

    match candidate {
        Candidate::New => AppPlan::new(StagingAction::Promote, Some(BootState::Applied)),
        Candidate::Corrupt => AppPlan {
            staging: StagingAction::Discard,
            state: Some(BootState::Failed),
            fault: true,
        },
        Candidate::Unchanged => AppPlan::new(StagingAction::Discard, Some(BootState::Idle)),
        Candidate::Residue => AppPlan::new(StagingAction::Discard, settle),
        Candidate::Empty => AppPlan::new(StagingAction::Keep, settle),
    }
}

pub struct BootSec<'a, F, C, P, R, W>
where
    F: FlashWriter,
    C: Checksum,
    P: StatefulOutputPin,
    R: Read,
    W: SharedWord,
{
    flash: &'a mut F,
    crc: &'a mut C,
    leds: &'a mut Indicators<P>,
    uart: &'a mut R,
    signal: &'a mut WarmSignal<W>,
    map: &'a PartitionMap,
}

impl<'a, F, C, P, R, W> BootSec<'a, F, C, P, R, W>
where
    F: FlashWriter,
    C: Checksum,
    P: StatefulOutputPin,
    R: Read,
    W: SharedWord,
{
    pub fn new(
        flash: &'a mut F,
        crc: &'a mut C,
        leds: &'a mut Indicators<P>,
        uart: &'a mut R,
        signal: &'a mut WarmSignal<W>,
        map: &'a PartitionMap,
    ) -> Self {
        Self {
            flash,
            crc,
            leds,
            uart,
            signal,
            map,
        }
    }

    pub fn run(&mut self) -> BootDecision {
        log::info!("boot-sec");

        let received = self.receive_update();
        self.settle_app_staging(received);
        self.select_app()
    }

    fn images(&mut self) -> ImageManager<'_, F, C> {
        ImageManager::new(self.flash, self.crc)
    }

    /// True iff a complete update image landed in staging.
    fn receive_update(&mut self) -> bool {
        if self.signal.pending() != UpdateRequest::ReceiveBinary {
            return false;
        }
        log::info!("update requested");
        self.leds.toggle_staged();

        let start = self.map.new_boot_sec.start();
        let result = self.prepare_staging(start).and_then(|_| {
            UartReceiver::new(&mut *self.uart, &mut *self.flash)
                .receive_image(start, UPDATE_IMAGE_SIZE)
        });
        self.signal.clear();

        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("update receive failed: {}", e);
                self.leds.raise_fault();
                // a half received stream must not reach either stage
                let cleared = self.images().clear_image(start, UPDATE_IMAGE_SIZE);
                if let Err(e) = cleared {
                    log::error!("staging not cleared: {}", e);
                }
                false
            }
        }
    }

    fn prepare_staging(&mut self, start: Address) -> Result<(), Error> {
        if self.images().is_region_erased(start, UPDATE_IMAGE_SIZE) {
            return Ok(());
        }
        self.images().clear_image(start, UPDATE_IMAGE_SIZE)
    }

    fn settle_app_staging(&mut self, received: bool) {
        let active = self.map.app;
        let staged = self.map.new_app;

        let state = BootFlagManager::new(&mut *self.flash).get_state();
        let candidate = self.images().classify(&active, &staged);
        let plan = app_plan(state, received, candidate);
        log::info!(
            "app candidate {} with state {} (received {}) -> {}",
            candidate,
            state,
            received,
            plan
        );

        if plan.staging == StagingAction::Promote {
            let copied = self
                .images()
                .write_image(staged.start(), active.start(), active.size());
            if let Err(e) = copied {
                // keep the candidate and ask for another attempt next boot
                log::error!("app promotion failed: {}", e);
                self.leds.raise_fault();
                if state != BootState::Staged {
                    self.persist(BootState::Staged);
                }
                return;
            }
            self.leds.toggle_promoted();
        }

        if let Some(next) = plan.state {
            if next != state {
                self.persist(next);
            }
        }

        if plan.fault {
            self.leds.raise_fault();
        }

        if plan.staging != StagingAction::Keep {
            let cleared = self.images().clear_image(staged.start(), staged.size());
            if let Err(e) = cleared {
                log::error!("app staging not cleared: {}", e);
                self.leds.raise_fault();
            }
        }
    }

    fn persist(&mut self, state: BootState) {
        if BootFlagManager::new(&mut *self.flash)
            .set_state(state)
            .is_err()
        {
            self.leds.raise_fault();
        }
    }

    fn select_app(&mut self) -> BootDecision {
        let app = self.map.app;
        if self.images().is_image_authentic(app.start(), app.metadata()) {
            log::info!("handing off to app at {:#x}", app.start());
            BootDecision::HandOff(app.start())
        } else {
            log::error!("no authentic app, halting");
            BootDecision::Halt
        }
    }
}
