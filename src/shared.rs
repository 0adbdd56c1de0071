/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Warm-jump signal between the application and boot-sec.
//!
//! The word lives in `SHARED_RAM`, a window the generated `memory.x` keeps
//! out of every stage's `RAM` region. No startup code zeroes or
//! initializes it, so a value written before a jump is still there after
//! it. A power-on reset leaves it undefined, which is why only the exact
//! [`PREPARE_TO_RECEIVE_BINARY`] pattern counts as a request.

use crate::types::PREPARE_TO_RECEIVE_BINARY;

/// Storage of the signal word.
pub trait SharedWord {
    fn load(&self) -> u32;
    fn store(&mut self, value: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateRequest {
    None,
    ReceiveBinary,
}

pub struct WarmSignal<W: SharedWord> {
    word: W,
}

impl<W: SharedWord> WarmSignal<W> {
    pub fn new(word: W) -> Self {
        Self { word }
    }

    pub fn pending(&self) -> UpdateRequest {
        match self.word.load() {
            PREPARE_TO_RECEIVE_BINARY => UpdateRequest::ReceiveBinary,
            _ => UpdateRequest::None,
        }
    }

    /// Set by the application right before jumping into boot-sec.
    pub fn request(&mut self) {
        self.word.store(PREPARE_TO_RECEIVE_BINARY);
    }

    /// Consumed by boot-sec once the receive finished.
    pub fn clear(&mut self) {
        self.word.store(0);
    }

    pub fn into_inner(self) -> W {
        self.word
    }
}

/// The signal word at its fixed SRAM address.
#[cfg(feature = "hw_f407_disco")]
pub struct SharedRam;

#[cfg(feature = "hw_f407_disco")]
impl SharedRam {
    const ADDRESS: *mut u32 = crate::types::partition::SHARED_RAM_START as *mut u32;
}

#[cfg(feature = "hw_f407_disco")]
impl SharedWord for SharedRam {
    fn load(&self) -> u32 {
        // SAFETY: aligned word inside SRAM, outside any linker section
        unsafe { core::ptr::read_volatile(Self::ADDRESS) }
    }

    fn store(&mut self, value: u32) {
        // SAFETY: see `load`
        unsafe { core::ptr::write_volatile(Self::ADDRESS, value) }
    }
}
