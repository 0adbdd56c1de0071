/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Raw address map of the STM32F407VG flash array and SRAM.
//!
//! This file is also pulled into `build.rs` to generate the per stage
//! `memory.x`, so it must stay free of crate and external dependencies.
//!
//! | Sector | Size   | Start       | Region                                           |
//! |--------|--------|-------------|--------------------------------------------------|
//! | 0      | 16 KiB | 0x0800_0000 | primary bootloader                               |
//! | 1      | 16 KiB | 0x0800_4000 | private certificate                              |
//! | 2      | 16 KiB | 0x0800_8000 | error log                                        |
//! | 3      | 16 KiB | 0x0800_C000 | boot flag / config                               |
//! | 4      | 64 KiB | 0x0801_0000 | secondary bootloader (+ 1 KiB footer)            |
//! | 5..=7  | 128 KiB| 0x0802_0000 | application (+ 1 KiB footer)                     |
//! | 8      | 128 KiB| 0x0808_0000 | reserved (lower) / staging secondary bootloader  |
//! | 9..=11 | 128 KiB| 0x080A_0000 | staging application (+ 1 KiB footer)             |

#![allow(dead_code)]

pub const FLASH_BASE: u32 = 0x0800_0000;
pub const FLASH_SIZE: u32 = 1024 * 1024;
pub const FLASH_END: u32 = FLASH_BASE + FLASH_SIZE;

/// Every updatable region ends with metadata (512 B) then a certificate slot (512 B).
pub const IMAGE_FOOTER_SIZE: u32 = 1024;
pub const METADATA_SLOT_SIZE: u32 = 512;
pub const CERT_SLOT_SIZE: u32 = 512;

pub const BOOT_PRIM_START: u32 = 0x0800_0000;
pub const BOOT_PRIM_SIZE: u32 = 16 * 1024;

pub const CERT_PRIVATE_START: u32 = 0x0800_4000;
pub const CERT_PRIVATE_SIZE: u32 = 16 * 1024;

pub const ERROR_LOG_START: u32 = 0x0800_8000;
pub const ERROR_LOG_SIZE: u32 = 16 * 1024;

pub const CONFIG_START: u32 = 0x0800_C000;
pub const CONFIG_SIZE: u32 = 16 * 1024;

pub const BOOT_SEC_START: u32 = 0x0801_0000;
pub const BOOT_SEC_SIZE: u32 = 64 * 1024;

pub const APP_START: u32 = 0x0802_0000;
pub const APP_SIZE: u32 = 3 * 128 * 1024;

pub const RESERVED_START: u32 = 0x0808_0000;
pub const RESERVED_SIZE: u32 = 64 * 1024;

pub const NEW_BOOT_SEC_START: u32 = 0x0809_0000;
pub const NEW_BOOT_SEC_SIZE: u32 = BOOT_SEC_SIZE;

pub const NEW_APP_START: u32 = 0x080A_0000;
pub const NEW_APP_SIZE: u32 = APP_SIZE;

pub const RAM_START: u32 = 0x2000_0000;
pub const RAM_SIZE: u32 = 128 * 1024;

/// Top of SRAM kept out of every stage's `RAM` region, so no startup code
/// zeroes or initializes it. Survives a jump, not a power-on reset.
pub const SHARED_RAM_SIZE: u32 = 16;
pub const SHARED_RAM_START: u32 = RAM_START + RAM_SIZE - SHARED_RAM_SIZE;

pub const fn metadata_address(region_start: u32, region_size: u32) -> u32 {
    region_start + region_size - IMAGE_FOOTER_SIZE
}

/// Length of the combined delivery stream: staging secondary bootloader
/// through the staging application metadata slot.
pub const UPDATE_IMAGE_SIZE: u32 =
    metadata_address(NEW_APP_START, NEW_APP_SIZE) + METADATA_SLOT_SIZE - NEW_BOOT_SEC_START;
