/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Once-per-power-up decision procedures of both boot stages.
//!
//! Each stage runs a straight line sequence and ends in a
//! [`BootDecision`]. The binaries turn `HandOff` into the jump and `Halt`
//! into [`blink_forever`]; everything before that is plain flash
//! inspection and can run against fakes.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;

use crate::Address;

pub mod boot_prim;
pub mod boot_sec;

pub use boot_prim::BootPrim;
pub use boot_sec::BootSec;

/// Half period of the terminal failure blink (1 Hz)
pub const FAILURE_BLINK_HALF_PERIOD_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootDecision {
    /// Jump into the image whose vector table starts here
    HandOff(Address),
    /// No authentic image to run, wait for external intervention
    Halt,
}

/// What happens to a staging slot after it was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StagingAction {
    /// Copy into the active slot, then erase staging
    Promote,
    /// Erase staging only
    Discard,
    /// Leave staging alone, it is already erased
    Keep,
}

/// Status LEDs driven by the boot stages.
pub struct Indicators<P: StatefulOutputPin> {
    /// Toggled when a candidate got promoted
    pub promoted: P,
    /// Toggled when an application candidate waits in staging
    pub staged: P,
    /// Lit on a corrupt candidate or a failed flag write
    pub fault: P,
}

impl<P: StatefulOutputPin> Indicators<P> {
    pub(crate) fn toggle_promoted(&mut self) {
        let _ = self.promoted.toggle();
    }

    pub(crate) fn toggle_staged(&mut self) {
        let _ = self.staged.toggle();
    }

    pub(crate) fn raise_fault(&mut self) {
        let _ = self.fault.set_high();
    }
}

/// Terminal failure state: toggle `pin` at 1 Hz forever.
pub fn blink_forever<P: StatefulOutputPin, D: DelayNs>(pin: &mut P, delay: &mut D) -> ! {
    loop {
        let _ = pin.toggle();
        delay.delay_ms(FAILURE_BLINK_HALF_PERIOD_MS);
    }
}
