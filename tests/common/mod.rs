/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! In-memory doubles for the flash array, LEDs, UART and warm signal.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::HashSet;
use std::convert::Infallible;

use ha_ctrl_boots::flash::{FlashWriter, WORD_SIZE};
use ha_ctrl_boots::orchestrator::Indicators;
use ha_ctrl_boots::shared::SharedWord;
use ha_ctrl_boots::types::flash_layout::{sector, ImageSlot, PARTITION_MAP};
use ha_ctrl_boots::types::metadata::Metadata;
use ha_ctrl_boots::types::partition::{FLASH_BASE, FLASH_SIZE};
use ha_ctrl_boots::types::update_image::seal_region;
use ha_ctrl_boots::types::ERASED_BYTE;
use ha_ctrl_boots::{Address, Error};

/// Critical section that only counts nesting, per test thread. The flash
/// model refuses to erase or program outside of it.
struct DepthCounted;
critical_section::set_impl!(DepthCounted);

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

unsafe impl critical_section::Impl for DepthCounted {
    unsafe fn acquire() -> critical_section::RawRestoreState {
        DEPTH.with(|depth| depth.set(depth.get() + 1));
    }

    unsafe fn release(_: critical_section::RawRestoreState) {
        DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

pub fn in_critical_section() -> bool {
    DEPTH.with(|depth| depth.get() > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Erase(u8),
    Write(Address, u32),
}

/// NOR flash model: erase sets whole sectors to 0xFF, programming can only
/// clear bits, and nothing is erasable or programmable while locked or
/// with interrupts enabled.
pub struct SimFlash {
    mem: Vec<u8>,
    unlocked: bool,
    pub ops: Vec<Op>,
    /// Words that silently refuse to program
    pub stuck: HashSet<Address>,
    /// Successful word writes left before one write fails, like a supply
    /// dip in the middle of a copy
    pub fail_write_after: Option<usize>,
}

impl SimFlash {
    pub fn new() -> Self {
        Self {
            mem: vec![ERASED_BYTE; FLASH_SIZE as usize],
            unlocked: false,
            ops: Vec::new(),
            stuck: HashSet::new(),
            fail_write_after: None,
        }
    }

    fn index(address: Address) -> usize {
        (address - FLASH_BASE) as usize
    }

    fn check(address: Address, len: usize) -> bool {
        address >= FLASH_BASE && Self::index(address) + len <= FLASH_SIZE as usize
    }

    /// Place bytes directly, as a programmer would.
    pub fn load(&mut self, address: Address, bytes: &[u8]) {
        let at = Self::index(address);
        self.mem[at..at + bytes.len()].copy_from_slice(bytes);
    }

    pub fn bytes(&self, address: Address, len: usize) -> &[u8] {
        let at = Self::index(address);
        &self.mem[at..at + len]
    }

    pub fn is_locked(&self) -> bool {
        !self.unlocked
    }

    pub fn erased_sectors(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Erase(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn writes_within(&self, start: Address, size: u32) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Write(a, _) if *a >= start && *a < start + size))
            .count()
    }

    /// Put a sealed image into `slot`, the way `fwpack region` lays it out.
    pub fn install(&mut self, slot: &ImageSlot, firmware: &[u8], version: u32) -> Metadata {
        let mut region = vec![0u8; slot.size() as usize];
        let metadata = seal_region(slot, firmware, version, 1_700_000_000, &mut region).unwrap();
        self.load(slot.start(), &region);
        metadata
    }
}

impl FlashWriter for SimFlash {
    fn unlock(&mut self) {
        self.unlocked = true;
    }

    fn lock(&mut self) {
        self.unlocked = false;
    }

    fn erase_sector(&mut self, index: u8) -> Result<(), Error> {
        if !self.unlocked || !in_critical_section() || index as usize >= 12 {
            return Err(Error::Erase(index));
        }
        let s = sector(index);
        let at = Self::index(s.start);
        self.mem[at..at + s.size as usize].fill(ERASED_BYTE);
        self.ops.push(Op::Erase(index));
        Ok(())
    }

    fn write_word(&mut self, address: Address, word: u32) -> Result<(), Error> {
        if !self.unlocked
            || !in_critical_section()
            || address % WORD_SIZE as u32 != 0
            || !Self::check(address, WORD_SIZE)
        {
            return Err(Error::Program(address));
        }
        match self.fail_write_after {
            Some(0) => {
                self.fail_write_after = None;
                return Err(Error::Program(address));
            }
            Some(n) => self.fail_write_after = Some(n - 1),
            None => {}
        }
        self.ops.push(Op::Write(address, word));
        if self.stuck.contains(&address) {
            return Ok(());
        }
        let at = Self::index(address);
        for (cell, byte) in self.mem[at..at + WORD_SIZE].iter_mut().zip(word.to_le_bytes()) {
            *cell &= byte;
        }
        Ok(())
    }

    fn read(&mut self, address: Address, bytes: &mut [u8]) -> Result<(), Error> {
        if !Self::check(address, bytes.len()) {
            return Err(Error::Read(address));
        }
        let at = Self::index(address);
        bytes.copy_from_slice(&self.mem[at..at + bytes.len()]);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakePin {
    pub high: bool,
    pub toggles: u32,
}

impl embedded_hal::digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

impl embedded_hal::digital::StatefulOutputPin for FakePin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.high = !self.high;
        self.toggles += 1;
        Ok(())
    }
}

pub fn leds() -> Indicators<FakePin> {
    Indicators {
        promoted: FakePin::default(),
        staged: FakePin::default(),
        fault: FakePin::default(),
    }
}

/// Serial link replaying a fixed byte stream. Once drained it reports a
/// link error instead of blocking.
pub struct ByteStream {
    data: Vec<u8>,
    pos: usize,
    /// Answer every other read with zero bytes, like a slow sender
    pub stutter: bool,
    polls: usize,
}

impl ByteStream {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pos: 0,
            stutter: false,
            polls: 0,
        }
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl embedded_io::ErrorType for ByteStream {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.polls += 1;
        if self.stutter && self.polls % 2 == 0 {
            return Ok(0);
        }
        if self.pos >= self.data.len() {
            return Err(embedded_io::ErrorKind::BrokenPipe);
        }
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Warm signal word in plain memory
#[derive(Debug, Default)]
pub struct RamWord(pub u32);

impl SharedWord for RamWord {
    fn load(&self) -> u32 {
        self.0
    }

    fn store(&mut self, value: u32) {
        self.0 = value;
    }
}

/// Deterministic firmware-looking bytes.
pub fn firmware(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

pub const MAP: &ha_ctrl_boots::types::flash_layout::PartitionMap = &PARTITION_MAP;
