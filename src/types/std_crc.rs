/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Image integrity checksum.
//!
//! The STM32F4 CRC unit computes CRC-32/MPEG-2 (poly `0x04C11DB7`, init
//! all-ones, no reflection, no final xor) over 32-bit words. Bytes are
//! assembled into words most significant byte first and a trailing partial
//! word is zero padded, which makes the result equal to CRC-32/MPEG-2 over
//! the byte stream extended with zeros to a word boundary. The software
//! engine below follows the same rule, so a value sealed by `fwpack` on the
//! host verifies on any stage, with or without the peripheral.

use crc::{Algorithm, Crc, Digest};

pub const STM32_CRC: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04C1_1DB7,
    init: 0xFFFF_FFFF,
    refin: false,
    refout: false,
    xorout: 0x0000_0000,
    check: 0x0376_E6E7,
    residue: 0x0000_0000,
};

static CRC: Crc<u32> = Crc::<u32>::new(&STM32_CRC);

/// A word-fed CRC engine, either the CRC peripheral or [`SoftwareCrc`].
pub trait Checksum {
    /// Restart from the initial value.
    fn reset(&mut self);
    /// Feed whole words, each already assembled most significant byte first.
    fn feed_words(&mut self, words: &[u32]);
    /// Current checksum value.
    fn value(&self) -> u32;
}

#[derive(Clone)]
pub struct SoftwareCrc {
    digest: Digest<'static, u32>,
}

impl SoftwareCrc {
    pub fn new() -> Self {
        Self {
            digest: CRC.digest(),
        }
    }
}

impl Default for SoftwareCrc {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for SoftwareCrc {
    fn reset(&mut self) {
        self.digest = CRC.digest();
    }

    fn feed_words(&mut self, words: &[u32]) {
        for word in words {
            self.digest.update(&word.to_be_bytes());
        }
    }

    fn value(&self) -> u32 {
        self.digest.clone().finalize()
    }
}

/// Streams arbitrary byte chunks into a [`Checksum`] engine, carrying an
/// incomplete word across chunk boundaries.
pub struct Crc32<'c, C: Checksum> {
    engine: &'c mut C,
    pending: [u8; 4],
    pending_len: usize,
}

impl<'c, C: Checksum> Crc32<'c, C> {
    pub fn new(engine: &'c mut C) -> Self {
        engine.reset();
        Self {
            engine,
            pending: [0; 4],
            pending_len: 0,
        }
    }

    pub fn update(&mut self, mut bytes: &[u8]) {
        if self.pending_len > 0 {
            let take = (4 - self.pending_len).min(bytes.len());
            self.pending[self.pending_len..self.pending_len + take].copy_from_slice(&bytes[..take]);
            self.pending_len += take;
            bytes = &bytes[take..];
            if self.pending_len < 4 {
                return;
            }
            self.engine.feed_words(&[u32::from_be_bytes(self.pending)]);
            self.pending_len = 0;
        }

        let mut words = [0u32; 16];
        let mut chunks = bytes.chunks_exact(4);
        loop {
            let mut n = 0;
            for chunk in chunks.by_ref().take(words.len()) {
                words[n] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                n += 1;
            }
            if n == 0 {
                break;
            }
            self.engine.feed_words(&words[..n]);
        }

        let rest = chunks.remainder();
        self.pending[..rest.len()].copy_from_slice(rest);
        self.pending_len = rest.len();
    }

    pub fn finalize(self) -> u32 {
        if self.pending_len > 0 {
            let mut last = [0u8; 4];
            last[..self.pending_len].copy_from_slice(&self.pending[..self.pending_len]);
            self.engine.feed_words(&[u32::from_be_bytes(last)]);
        }
        self.engine.value()
    }
}

/// Checksum of `bytes` as the CRC unit would compute it.
pub fn compute(bytes: &[u8]) -> u32 {
    compute_with(&mut SoftwareCrc::new(), bytes)
}

pub fn compute_with<C: Checksum>(engine: &mut C, bytes: &[u8]) -> u32 {
    let mut crc = Crc32::new(engine);
    crc.update(bytes);
    crc.finalize()
}

pub fn verify(bytes: &[u8], expected: u32) -> bool {
    compute(bytes) == expected
}
