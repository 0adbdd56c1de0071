/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Secondary bootloader, entered from boot-prim or from the application
//! with a pending update request.

#![no_main]
#![no_std]

use cortex_m_rt::entry;
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use ha_ctrl_boots::boards::Board;
use ha_ctrl_boots::handoff;
use ha_ctrl_boots::orchestrator::{blink_forever, BootDecision, BootSec};
use ha_ctrl_boots::types::flash_layout::PARTITION_MAP;
use panic_abort as _;

#[entry]
fn main() -> ! {
    let mut board = Board::init();
    let hw = &mut board.hardware;

    let decision = BootSec::new(
        &mut hw.flash,
        &mut hw.crc,
        &mut hw.leds,
        &mut hw.uart,
        &mut board.signal,
        &PARTITION_MAP,
    )
    .run();

    match decision {
        BootDecision::HandOff(base) => unsafe { handoff::jump(base) },
        BootDecision::Halt => blink_forever(&mut hw.leds.fault, &mut hw.delay),
    }
}
