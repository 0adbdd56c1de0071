/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

/// How four bytes taken off the serial link become one flash word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordOrder {
    /// First received byte lands at the lowest address of the word
    LsbFirst,
    /// First received byte becomes the most significant byte
    MsbFirst,
}

/// Packing used by the update receiver.
///
/// The Cortex-M4 stores words little endian, so `LsbFirst` puts the wire
/// bytes into flash in wire order. The CRC sealed by `fwpack` over the
/// update file is then the CRC the stages compute over flash.
pub const WIRE_WORD_ORDER: WordOrder = WordOrder::LsbFirst;

impl WordOrder {
    pub const fn pack(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::LsbFirst => u32::from_le_bytes(bytes),
            Self::MsbFirst => u32::from_be_bytes(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_order_preserves_byte_sequence_in_memory() {
        let wire = [0x10, 0x20, 0x30, 0x40];
        let word = WIRE_WORD_ORDER.pack(wire);
        assert_eq!(word.to_le_bytes(), wire);
    }

    #[test]
    fn msb_first_reverses_bytes_in_memory() {
        let word = WordOrder::MsbFirst.pack([0x10, 0x20, 0x30, 0x40]);
        assert_eq!(word, 0x1020_3040);
        assert_eq!(word.to_le_bytes(), [0x40, 0x30, 0x20, 0x10]);
    }
}
