/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use super::{std_crc, METADATA_MAGIC};

/// Record stored at the start of every image's metadata slot.
///
/// Packed little endian, 64 bytes:
/// `magic | version | build_timestamp | firmware_size | firmware_crc | reserved[3] | hash[32]`.
///
/// `version` is `0xMMmmpp` (major, minor, patch). The hash field is
/// reserved for a SHA-256 over the firmware area and is not checked by any
/// stage yet.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Metadata {
    pub magic: u32,
    pub version: u32,
    pub build_timestamp: u32,
    pub firmware_size: u32,
    pub firmware_crc: u32,
    pub reserved: [u32; 3],
    pub firmware_hash: [u8; 32],
}

static_assertions::assert_eq_size!(Metadata, [u8; Metadata::SIZE]);

impl Metadata {
    pub const SIZE: usize = 64;

    /// Builds the record describing `firmware`.
    pub fn seal(firmware: &[u8], version: u32, build_timestamp: u32) -> Self {
        Self {
            magic: METADATA_MAGIC,
            version,
            build_timestamp,
            firmware_size: firmware.len() as u32,
            firmware_crc: std_crc::compute(firmware),
            reserved: [0; 3],
            firmware_hash: [0; 32],
        }
    }

    /// A record is trustworthy only behind the magic; anything else,
    /// including erased flash, means "no image".
    pub const fn is_present(&self) -> bool {
        self.magic == METADATA_MAGIC
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        let mut firmware_hash = [0u8; 32];
        firmware_hash.copy_from_slice(&bytes[32..64]);

        Self {
            magic: word(0),
            version: word(4),
            build_timestamp: word(8),
            firmware_size: word(12),
            firmware_crc: word(16),
            reserved: [word(20), word(24), word(28)],
            firmware_hash,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        let words = [
            self.magic,
            self.version,
            self.build_timestamp,
            self.firmware_size,
            self.firmware_crc,
            self.reserved[0],
            self.reserved[1],
            self.reserved[2],
        ];
        for (dst, word) in out.chunks_exact_mut(4).zip(words) {
            dst.copy_from_slice(&word.to_le_bytes());
        }
        out[32..].copy_from_slice(&self.firmware_hash);
        out
    }

    /// `(major, minor, patch)`
    pub const fn semver(&self) -> (u8, u8, u8) {
        (
            (self.version >> 16) as u8,
            (self.version >> 8) as u8,
            self.version as u8,
        )
    }
}
