/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use thiserror::Error;

use crate::Address;

/// Errors raised by the flash primitive, the flag manager, the image
/// manager and the update receiver. The boot orchestrators resolve every
/// one of them locally; nothing above them ever sees an `Error`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The flash controller reported a failed sector erase
    #[error("sector {0} erase failed")]
    Erase(u8),

    /// The flash controller reported a failed word program
    #[error("program failed at {0:#010x}")]
    Program(Address),

    /// Reading back flash through the primitive failed
    #[error("read failed at {0:#010x}")]
    Read(Address),

    /// The address range does not lie inside the flash array
    #[error("address {0:#010x} outside flash")]
    OutOfRange(Address),

    /// A word read back after programming differs from what was written
    #[error("readback mismatch at {address:#010x}: wrote {expected:#010x}, read {actual:#010x}")]
    WriteVerification {
        address: Address,
        expected: u32,
        actual: u32,
    },

    /// The serial link reported an error (overrun, framing, noise)
    #[error("serial link error")]
    Serial,

    /// Firmware does not fit in front of its metadata slot
    #[error("image of {size} bytes exceeds region capacity {capacity}")]
    ImageTooLarge { size: usize, capacity: usize },

    /// Output buffer shorter than the layout it has to hold
    #[error("output buffer of {len} bytes, {needed} required")]
    BufferTooSmall { len: usize, needed: usize },
}
