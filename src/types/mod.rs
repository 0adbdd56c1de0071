/*
 * SPDX-FileCopyrightText: © 2023 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

/// Every cell of an erased sector reads back as this byte
pub const ERASED_BYTE: u8 = 0xFF;
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

/// Magic of a present metadata record
pub const METADATA_MAGIC: u32 = 0xDEAD_BEEF;

/// Warm signal value written by the application before entering boot-sec
pub const PREPARE_TO_RECEIVE_BINARY: u32 = 0xFEED_C0DE;

pub mod boot_state;
pub mod flash_layout;
pub mod metadata;
pub mod partition;
pub mod std_crc;
pub mod update_image;
pub mod word_order;
