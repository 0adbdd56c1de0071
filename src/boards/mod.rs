/*
 * SPDX-FileCopyrightText: © 2023 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use embassy_stm32::crc::Crc;
use embassy_stm32::flash::{Blocking, Flash};
use embassy_stm32::gpio::{AnyPin, Output};
use embassy_stm32::peripherals;
use embassy_stm32::usart::BufferedUart;

#[cfg(feature = "hw_f407_disco")]
use self::stm32f407_disco::*;
use crate::flash::FlashWriter;
use crate::orchestrator::Indicators;
use crate::shared::{SharedRam, WarmSignal};
use crate::types::flash_layout::sector;
use crate::types::partition::FLASH_BASE;
use crate::types::std_crc::Checksum;
use crate::{Address, Error};

#[cfg(feature = "hw_f407_disco")]
mod stm32f407_disco;

pub type Led = Output<'static, AnyPin>;

/// [`FlashWriter`] over the embassy blocking flash driver.
///
/// The driver unlocks and locks the controller around every operation on
/// its own, so `unlock` and `lock` have nothing left to do.
pub struct Stm32FlashWriter<'d> {
    flash: Flash<'d, Blocking>,
}

impl<'d> Stm32FlashWriter<'d> {
    pub fn new(flash: Flash<'d, Blocking>) -> Self {
        Self { flash }
    }

    const fn offset(address: Address) -> u32 {
        address - FLASH_BASE
    }
}

impl FlashWriter for Stm32FlashWriter<'_> {
    fn unlock(&mut self) {}

    fn lock(&mut self) {}

    fn erase_sector(&mut self, index: u8) -> Result<(), Error> {
        let from = Self::offset(sector(index).start);
        let to = Self::offset(sector(index).end());
        self.flash
            .blocking_erase(from, to)
            .map_err(|_| Error::Erase(index))
    }

    fn write_word(&mut self, address: Address, word: u32) -> Result<(), Error> {
        self.flash
            .blocking_write(Self::offset(address), &word.to_le_bytes())
            .map_err(|_| Error::Program(address))
    }

    fn read(&mut self, address: Address, bytes: &mut [u8]) -> Result<(), Error> {
        self.flash
            .blocking_read(Self::offset(address), bytes)
            .map_err(|_| Error::Read(address))
    }
}

/// [`Checksum`] on the CRC unit. Its fixed CRC-32/MPEG-2 word algorithm
/// matches [`crate::types::std_crc::SoftwareCrc`] bit for bit.
pub struct HardwareCrc<'d> {
    crc: Crc<'d>,
}

impl<'d> HardwareCrc<'d> {
    pub fn new(crc: Crc<'d>) -> Self {
        Self { crc }
    }
}

impl Checksum for HardwareCrc<'_> {
    fn reset(&mut self) {
        self.crc.reset();
    }

    fn feed_words(&mut self, words: &[u32]) {
        self.crc.feed_words(words);
    }

    fn value(&self) -> u32 {
        self.crc.read()
    }
}

pub struct Hardware {
    pub flash: Stm32FlashWriter<'static>,
    pub crc: HardwareCrc<'static>,
    pub uart: BufferedUart<'static, peripherals::USART2>,
    /// Green, lit while a boot stage runs
    pub heartbeat: Led,
    pub leds: Indicators<Led>,
    pub delay: embassy_time::Delay,
}

impl Hardware {
    /// Initialize MCU clocks on reset defaults
    pub fn mcu_pre_init() -> embassy_stm32::Peripherals {
        embassy_stm32::init(Default::default())
    }

    /// Initialize MCU peripherals and nearby components
    #[inline]
    fn hardware_init(peripherals: embassy_stm32::Peripherals) -> Hardware {
        hardware_specific_init(peripherals)
    }
}

pub struct Board {
    pub hardware: Hardware,
    pub signal: WarmSignal<SharedRam>,
}

impl Board {
    pub fn init() -> Self {
        let peripherals = Hardware::mcu_pre_init();
        let hardware = Hardware::hardware_init(peripherals);

        Self {
            hardware,
            signal: WarmSignal::new(SharedRam),
        }
    }
}
