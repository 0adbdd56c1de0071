/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Host side image sealing, shared by `fwpack` and the tests.
//!
//! The combined update stream mirrors the staging area byte for byte,
//! starting at the staging secondary bootloader:
//!
//! | Offset     | Content                              |
//! |------------|--------------------------------------|
//! | `0x00000`  | secondary bootloader, 0xFF fill      |
//! | `0x0FC00`  | secondary bootloader metadata slot   |
//! | `0x0FE00`  | certificate slot (0xFF)              |
//! | `0x10000`  | application, 0xFF fill               |
//! | `0x6FC00`  | application metadata slot            |

use super::flash_layout::{ImageSlot, PARTITION_MAP};
use super::metadata::Metadata;
use super::partition::UPDATE_IMAGE_SIZE;
use super::ERASED_BYTE;
use crate::Error;

/// Writes `firmware` and its metadata into `out`, laid out as `slot`.
/// At most the slot's length of `out` is touched; `out` may stop early but
/// must at least cover the metadata record.
pub fn seal_region(
    slot: &ImageSlot,
    firmware: &[u8],
    version: u32,
    build_timestamp: u32,
    out: &mut [u8],
) -> Result<Metadata, Error> {
    let capacity = slot.firmware_capacity() as usize;
    if firmware.len() > capacity {
        return Err(Error::ImageTooLarge {
            size: firmware.len(),
            capacity,
        });
    }

    let offset = (slot.metadata() - slot.start()) as usize;
    let len = out.len().min(slot.size() as usize);
    if len < offset + Metadata::SIZE {
        return Err(Error::BufferTooSmall {
            len: out.len(),
            needed: offset + Metadata::SIZE,
        });
    }

    let region = &mut out[..len];
    region.fill(ERASED_BYTE);
    region[..firmware.len()].copy_from_slice(firmware);

    let metadata = Metadata::seal(firmware, version, build_timestamp);
    region[offset..offset + Metadata::SIZE].copy_from_slice(&metadata.to_bytes());

    Ok(metadata)
}

/// Release parameters of one image inside the bundle.
#[derive(Debug, Clone, Copy)]
pub struct ImageRelease<'a> {
    pub firmware: &'a [u8],
    pub version: u32,
    pub build_timestamp: u32,
}

/// Builds the stream `boot-sec` receives into staging. `out` must hold
/// exactly [`UPDATE_IMAGE_SIZE`] bytes, anything else is
/// [`Error::BufferTooSmall`].
pub fn build_update_image(
    boot_sec: ImageRelease<'_>,
    app: ImageRelease<'_>,
    out: &mut [u8],
) -> Result<(Metadata, Metadata), Error> {
    if out.len() != UPDATE_IMAGE_SIZE as usize {
        return Err(Error::BufferTooSmall {
            len: out.len(),
            needed: UPDATE_IMAGE_SIZE as usize,
        });
    }

    let base = PARTITION_MAP.new_boot_sec.start();
    out.fill(ERASED_BYTE);

    let sec_slot = PARTITION_MAP.new_boot_sec;
    let sec_offset = (sec_slot.start() - base) as usize;
    let sec_meta = seal_region(
        &sec_slot,
        boot_sec.firmware,
        boot_sec.version,
        boot_sec.build_timestamp,
        &mut out[sec_offset..],
    )?;

    // the stream stops right after the application metadata slot
    let app_slot = PARTITION_MAP.new_app;
    let app_offset = (app_slot.start() - base) as usize;
    let app_meta = seal_region(
        &app_slot,
        app.firmware,
        app.version,
        app.build_timestamp,
        &mut out[app_offset..],
    )?;

    Ok((sec_meta, app_meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::std_crc;

    fn offset_of(address: u32) -> usize {
        (address - PARTITION_MAP.new_boot_sec.start()) as usize
    }

    #[test]
    fn bundle_places_each_record_at_its_staging_address() {
        let sec = [0x5Au8; 1000];
        let app = [0xC3u8; 4097];
        let mut out = vec![0u8; UPDATE_IMAGE_SIZE as usize];

        let (sec_meta, app_meta) = build_update_image(
            ImageRelease {
                firmware: &sec,
                version: 0x000501,
                build_timestamp: 10,
            },
            ImageRelease {
                firmware: &app,
                version: 0x010000,
                build_timestamp: 20,
            },
            &mut out,
        )
        .unwrap();

        let at = offset_of(PARTITION_MAP.new_boot_sec.metadata());
        let bytes: &[u8; Metadata::SIZE] = out[at..at + Metadata::SIZE].try_into().unwrap();
        assert_eq!(Metadata::from_bytes(bytes), sec_meta);

        let at = offset_of(PARTITION_MAP.new_app.metadata());
        let bytes: &[u8; Metadata::SIZE] = out[at..at + Metadata::SIZE].try_into().unwrap();
        assert_eq!(Metadata::from_bytes(bytes), app_meta);

        let app_start = offset_of(PARTITION_MAP.new_app.start());
        assert!(std_crc::verify(&out[app_start..app_start + app.len()], app_meta.firmware_crc));
        assert_eq!(out[app_start + app.len()], ERASED_BYTE);
        assert_eq!(out[sec.len()], ERASED_BYTE);
    }

    #[test]
    fn oversized_firmware_is_rejected() {
        let slot = PARTITION_MAP.new_boot_sec;
        let firmware = vec![0u8; slot.firmware_capacity() as usize + 1];
        let mut out = vec![0u8; slot.size() as usize];

        assert_eq!(
            seal_region(&slot, &firmware, 1, 1, &mut out),
            Err(Error::ImageTooLarge {
                size: firmware.len(),
                capacity: slot.firmware_capacity() as usize,
            })
        );
    }

    #[test]
    fn short_buffers_are_errors() {
        let slot = PARTITION_MAP.app;
        let needed = (slot.metadata() - slot.start()) as usize + Metadata::SIZE;
        let mut out = vec![0u8; needed - 1];
        assert_eq!(
            seal_region(&slot, &[1, 2, 3], 1, 1, &mut out),
            Err(Error::BufferTooSmall {
                len: needed - 1,
                needed
            })
        );

        let release = ImageRelease {
            firmware: &[0xAA; 16],
            version: 1,
            build_timestamp: 1,
        };
        let mut out = vec![0u8; UPDATE_IMAGE_SIZE as usize - 4];
        assert_eq!(
            build_update_image(release, release, &mut out),
            Err(Error::BufferTooSmall {
                len: UPDATE_IMAGE_SIZE as usize - 4,
                needed: UPDATE_IMAGE_SIZE as usize
            })
        );
    }

    #[test]
    fn sealed_region_keeps_the_certificate_slot_erased() {
        let slot = PARTITION_MAP.boot_sec;
        let mut out = vec![0u8; slot.size() as usize];
        seal_region(&slot, &[1, 2, 3, 4, 5], 1, 1, &mut out).unwrap();

        let cert = (slot.certificate() - slot.start()) as usize;
        assert!(out[cert..].iter().all(|b| *b == ERASED_BYTE));
        assert_eq!(out[..5], [1, 2, 3, 4, 5]);
    }
}
