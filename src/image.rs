/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Sector aware image copy, erase and inspection.

use crate::flash::{FlashWriter, READ_CHUNK_SIZE};
use crate::log;
use crate::types::flash_layout::{in_flash, sector, sector_from_address, ImageSlot};
use crate::types::metadata::Metadata;
use crate::types::std_crc::{Checksum, Crc32};
use crate::types::ERASED_BYTE;
use crate::{Address, Error};

/// What a staging slot holds, relative to its active counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Candidate {
    /// No magic and every byte erased
    Empty,
    /// No magic but leftovers, e.g. an aborted receive
    Residue,
    /// Magic present, size or CRC wrong
    Corrupt,
    /// Authentic and metadata-identical to the active image
    Unchanged,
    /// Authentic and different from the active image
    New,
}

pub struct ImageManager<'a, F: FlashWriter, C: Checksum> {
    writer: &'a mut F,
    crc: &'a mut C,
}

impl<'a, F: FlashWriter, C: Checksum> ImageManager<'a, F, C> {
    pub fn new(writer: &'a mut F, crc: &'a mut C) -> Self {
        Self { writer, crc }
    }

    /// Erase every sector covering `[dst, dst + size)` once, then copy
    /// `size` bytes from `src` word by word. Runs in one critical section.
    ///
    /// Not transactional: a power cut leaves the destination partly
    /// written. Callers keep the source intact until the copy finished so
    /// the promotion can simply run again.
    pub fn write_image(&mut self, src: Address, dst: Address, size: u32) -> Result<(), Error> {
        Self::check_range(src, size)?;
        Self::check_range(dst, size)?;
        log::info!("write image {:#x} -> {:#x} ({} bytes)", src, dst, size);

        critical_section::with(|_| {
            self.writer.unlock();
            let result = Self::erase_span(self.writer, dst, size)
                .and_then(|_| self.writer.copy_words(src, dst, size as usize));
            self.writer.lock();
            result
        })
    }

    /// Erase every sector covering `[start, start + size)`.
    pub fn clear_image(&mut self, start: Address, size: u32) -> Result<(), Error> {
        Self::check_range(start, size)?;
        log::info!("clear image {:#x} ({} bytes)", start, size);

        critical_section::with(|_| {
            self.writer.unlock();
            let result = Self::erase_span(self.writer, start, size);
            self.writer.lock();
            result
        })
    }

    pub fn read_metadata(&mut self, metadata: Address) -> Result<Metadata, Error> {
        let mut bytes = [0u8; Metadata::SIZE];
        self.writer.read(metadata, &mut bytes)?;
        Ok(Metadata::from_bytes(&bytes))
    }

    /// True iff the record at `metadata` carries the magic.
    pub fn is_image_staged(&mut self, metadata: Address) -> bool {
        match self.read_metadata(metadata) {
            Ok(meta) => meta.is_present(),
            Err(e) => {
                log::warn!("metadata at {:#x} unreadable: {}", metadata, e);
                false
            }
        }
    }

    /// True iff staged and the CRC over `firmware_size` bytes from
    /// `firmware` matches the record. Absence is checked before
    /// corruption.
    pub fn is_image_authentic(&mut self, firmware: Address, metadata: Address) -> bool {
        let meta = match self.read_metadata(metadata) {
            Ok(meta) if meta.is_present() => meta,
            Ok(_) => return false,
            Err(e) => {
                log::warn!("metadata at {:#x} unreadable: {}", metadata, e);
                return false;
            }
        };

        // the firmware has to end before its own metadata record
        if metadata < firmware || meta.firmware_size > metadata - firmware {
            log::warn!(
                "image at {:#x} declares {} bytes, only {} available",
                firmware,
                meta.firmware_size,
                metadata.saturating_sub(firmware)
            );
            return false;
        }

        match self.checksum(firmware, meta.firmware_size) {
            Ok(actual) if actual == meta.firmware_crc => true,
            Ok(actual) => {
                log::warn!(
                    "image at {:#x} crc {:#x}, expected {:#x}",
                    firmware,
                    actual,
                    meta.firmware_crc
                );
                false
            }
            Err(e) => {
                log::warn!("image at {:#x} unreadable: {}", firmware, e);
                false
            }
        }
    }

    /// Byte compare of two metadata records. An unreadable record counts
    /// as different.
    pub fn is_image_different(&mut self, active: Address, staged: Address) -> bool {
        match (self.read_metadata(active), self.read_metadata(staged)) {
            (Ok(a), Ok(b)) => a.to_bytes() != b.to_bytes(),
            _ => true,
        }
    }

    /// True iff every byte of the range reads as erased.
    pub fn is_region_erased(&mut self, start: Address, size: u32) -> bool {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        let mut offset = 0u32;

        while offset < size {
            let n = ((size - offset) as usize).min(READ_CHUNK_SIZE);
            if self.writer.read(start + offset, &mut buf[..n]).is_err() {
                return false;
            }
            if buf[..n].iter().any(|b| *b != ERASED_BYTE) {
                return false;
            }
            offset += n as u32;
        }
        true
    }

    /// Classify the staging slot `staged` against the active slot `active`.
    pub fn classify(&mut self, active: &ImageSlot, staged: &ImageSlot) -> Candidate {
        let candidate = if !self.is_image_staged(staged.metadata()) {
            if self.is_region_erased(staged.start(), staged.size()) {
                Candidate::Empty
            } else {
                Candidate::Residue
            }
        } else if !self.is_image_authentic(staged.start(), staged.metadata()) {
            Candidate::Corrupt
        } else if self.is_image_different(active.metadata(), staged.metadata()) {
            Candidate::New
        } else {
            Candidate::Unchanged
        };

        log::info!("staging {:#x}: {}", staged.start(), candidate);
        candidate
    }

    fn checksum(&mut self, start: Address, size: u32) -> Result<u32, Error> {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        let mut crc = Crc32::new(self.crc);
        let mut offset = 0u32;

        while offset < size {
            let n = ((size - offset) as usize).min(READ_CHUNK_SIZE);
            self.writer.read(start + offset, &mut buf[..n])?;
            crc.update(&buf[..n]);
            offset += n as u32;
        }
        Ok(crc.finalize())
    }

    fn erase_span(writer: &mut F, start: Address, size: u32) -> Result<(), Error> {
        let end = start + size;
        let mut address = start;

        while address < end {
            let index = sector_from_address(address);
            writer.erase_sector(index)?;
            address = sector(index).end();
        }
        Ok(())
    }

    fn check_range(start: Address, size: u32) -> Result<(), Error> {
        if in_flash(start, size) {
            Ok(())
        } else {
            Err(Error::OutOfRange(start))
        }
    }
}
