/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Sector table and the compile-time partition map.
//!
//! Addresses handed to these lookups always come from [`PARTITION_MAP`],
//! never from outside input, so there is no runtime error path. A lookup
//! outside the flash array is a programming defect and trips a debug
//! assertion; release builds clamp to the nearest sector.

use super::partition::*;
use crate::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sector {
    pub start: Address,
    pub size: u32,
}

impl Sector {
    pub const fn end(&self) -> Address {
        self.start + self.size
    }

    pub const fn contains(&self, address: Address) -> bool {
        address >= self.start && address < self.end()
    }
}

const KIB: u32 = 1024;

/// STM32F407VG single bank organisation: 4 x 16 KiB, 1 x 64 KiB, 7 x 128 KiB.
pub const SECTORS: [Sector; 12] = [
    Sector { start: 0x0800_0000, size: 16 * KIB },
    Sector { start: 0x0800_4000, size: 16 * KIB },
    Sector { start: 0x0800_8000, size: 16 * KIB },
    Sector { start: 0x0800_C000, size: 16 * KIB },
    Sector { start: 0x0801_0000, size: 64 * KIB },
    Sector { start: 0x0802_0000, size: 128 * KIB },
    Sector { start: 0x0804_0000, size: 128 * KIB },
    Sector { start: 0x0806_0000, size: 128 * KIB },
    Sector { start: 0x0808_0000, size: 128 * KIB },
    Sector { start: 0x080A_0000, size: 128 * KIB },
    Sector { start: 0x080C_0000, size: 128 * KIB },
    Sector { start: 0x080E_0000, size: 128 * KIB },
];

pub const SECTOR_COUNT: usize = SECTORS.len();

/// Index of the sector holding `address`.
pub const fn sector_from_address(address: Address) -> u8 {
    debug_assert!(address >= FLASH_BASE && address < FLASH_END);

    let mut i = 1;
    while i < SECTOR_COUNT {
        if address < SECTORS[i].start {
            return (i - 1) as u8;
        }
        i += 1;
    }
    (SECTOR_COUNT - 1) as u8
}

/// Erase-unit size of `sector` in bytes.
pub const fn sector_size(sector: u8) -> u32 {
    debug_assert!((sector as usize) < SECTOR_COUNT);
    SECTORS[sector as usize].size
}

pub const fn sector_start(sector: u8) -> Address {
    debug_assert!((sector as usize) < SECTOR_COUNT);
    SECTORS[sector as usize].start
}

pub const fn sector(sector: u8) -> Sector {
    SECTORS[sector as usize]
}

/// True when `[start, start + size)` lies inside the flash array.
pub const fn in_flash(start: Address, size: u32) -> bool {
    start >= FLASH_BASE && start <= FLASH_END && size <= FLASH_END - start
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    pub start: Address,
    pub size: u32,
}

impl Region {
    pub const fn end(&self) -> Address {
        self.start + self.size
    }
}

/// An updatable region: firmware area followed by the metadata and
/// certificate footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImageSlot {
    pub region: Region,
}

impl ImageSlot {
    pub const fn new(start: Address, size: u32) -> Self {
        Self {
            region: Region { start, size },
        }
    }

    pub const fn start(&self) -> Address {
        self.region.start
    }

    pub const fn size(&self) -> u32 {
        self.region.size
    }

    pub const fn metadata(&self) -> Address {
        metadata_address(self.region.start, self.region.size)
    }

    pub const fn certificate(&self) -> Address {
        self.metadata() + METADATA_SLOT_SIZE
    }

    /// Largest firmware that fits in front of the metadata slot.
    pub const fn firmware_capacity(&self) -> u32 {
        self.region.size - IMAGE_FOOTER_SIZE
    }
}

/// Every named region of the flash array. Active regions and their staging
/// counterparts have identical size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartitionMap {
    pub boot_prim: Region,
    pub cert_private: Region,
    pub error_log: Region,
    pub config: Region,
    pub boot_sec: ImageSlot,
    pub app: ImageSlot,
    pub reserved: Region,
    pub new_boot_sec: ImageSlot,
    pub new_app: ImageSlot,
}

impl PartitionMap {
    /// Address of the persisted boot state word.
    pub const fn boot_flag(&self) -> Address {
        self.config.start
    }

    /// Regions in address order.
    pub const fn regions(&self) -> [Region; 9] {
        [
            self.boot_prim,
            self.cert_private,
            self.error_log,
            self.config,
            self.boot_sec.region,
            self.app.region,
            self.reserved,
            self.new_boot_sec.region,
            self.new_app.region,
        ]
    }
}

pub const PARTITION_MAP: PartitionMap = PartitionMap {
    boot_prim: Region {
        start: BOOT_PRIM_START,
        size: BOOT_PRIM_SIZE,
    },
    cert_private: Region {
        start: CERT_PRIVATE_START,
        size: CERT_PRIVATE_SIZE,
    },
    error_log: Region {
        start: ERROR_LOG_START,
        size: ERROR_LOG_SIZE,
    },
    config: Region {
        start: CONFIG_START,
        size: CONFIG_SIZE,
    },
    boot_sec: ImageSlot::new(BOOT_SEC_START, BOOT_SEC_SIZE),
    app: ImageSlot::new(APP_START, APP_SIZE),
    reserved: Region {
        start: RESERVED_START,
        size: RESERVED_SIZE,
    },
    new_boot_sec: ImageSlot::new(NEW_BOOT_SEC_START, NEW_BOOT_SEC_SIZE),
    new_app: ImageSlot::new(NEW_APP_START, NEW_APP_SIZE),
};

static_assertions::const_assert_eq!(BOOT_SEC_SIZE, NEW_BOOT_SEC_SIZE);
static_assertions::const_assert_eq!(APP_SIZE, NEW_APP_SIZE);
static_assertions::const_assert_eq!(SECTORS[0].start, FLASH_BASE);
static_assertions::const_assert_eq!(SECTORS[SECTOR_COUNT - 1].start + SECTORS[SECTOR_COUNT - 1].size, FLASH_END);
// the boot flag sector holds nothing but the flag
static_assertions::const_assert_eq!(CONFIG_SIZE, SECTORS[3].size);
static_assertions::const_assert_eq!(CONFIG_START, SECTORS[3].start);
