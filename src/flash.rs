/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! The flash primitive every stage programs through.
//!
//! Implementations must not disable interrupts themselves beyond what
//! their driver needs; callers wrap whole operations in
//! `critical_section::with`.

use crate::{Address, Error};

pub const WORD_SIZE: usize = core::mem::size_of::<u32>();

/// Chunk used when streaming flash contents through the primitive
pub const READ_CHUNK_SIZE: usize = 256;

pub trait FlashWriter {
    /// Open the controller for erase and program. Idempotent.
    fn unlock(&mut self);

    /// Close the controller again.
    fn lock(&mut self);

    /// Erase one whole sector, every byte reads back as the erased pattern.
    fn erase_sector(&mut self, sector: u8) -> Result<(), Error>;

    /// Program one aligned word. Programming can only clear bits; the
    /// target word should be erased.
    fn write_word(&mut self, address: Address, word: u32) -> Result<(), Error>;

    /// Read already programmed flash.
    fn read(&mut self, address: Address, bytes: &mut [u8]) -> Result<(), Error>;

    fn read_word(&mut self, address: Address) -> Result<u32, Error> {
        let mut bytes = [0u8; WORD_SIZE];
        self.read(address, &mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    /// Word granular copy of `len` bytes, rounded up to whole words.
    /// The destination must already be erased.
    fn copy_words(&mut self, src: Address, dst: Address, len: usize) -> Result<(), Error> {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        let mut offset = 0;
        let len = len.next_multiple_of(WORD_SIZE);

        while offset < len {
            let n = (len - offset).min(READ_CHUNK_SIZE);
            self.read(src + offset as Address, &mut buf[..n])?;
            for (i, word) in buf[..n].chunks_exact(WORD_SIZE).enumerate() {
                let word = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
                self.write_word(dst + (offset + i * WORD_SIZE) as Address, word)?;
            }
            offset += n;
        }

        Ok(())
    }
}

impl<T: FlashWriter + ?Sized> FlashWriter for &mut T {
    fn unlock(&mut self) {
        T::unlock(self)
    }

    fn lock(&mut self) {
        T::lock(self)
    }

    fn erase_sector(&mut self, sector: u8) -> Result<(), Error> {
        T::erase_sector(self, sector)
    }

    fn write_word(&mut self, address: Address, word: u32) -> Result<(), Error> {
        T::write_word(self, address, word)
    }

    fn read(&mut self, address: Address, bytes: &mut [u8]) -> Result<(), Error> {
        T::read(self, address, bytes)
    }

    fn read_word(&mut self, address: Address) -> Result<u32, Error> {
        T::read_word(self, address)
    }

    fn copy_words(&mut self, src: Address, dst: Address, len: usize) -> Result<(), Error> {
        T::copy_words(self, src, dst, len)
    }
}
