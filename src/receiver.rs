/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Raw image delivery over a serial link.
//!
//! The host streams the update image as plain bytes, no framing and no
//! flow control. Every four bytes become one flash word packed with
//! [`WIRE_WORD_ORDER`]; a final partial group is padded with the erased
//! pattern. There is no timeout: a stalled sender blocks the stage.

use embedded_io::Read;

use crate::flash::{FlashWriter, WORD_SIZE};
use crate::log;
use crate::types::flash_layout::in_flash;
use crate::types::word_order::WIRE_WORD_ORDER;
use crate::types::ERASED_BYTE;
use crate::{Address, Error};

pub struct UartReceiver<'a, R: Read, F: FlashWriter> {
    uart: &'a mut R,
    writer: &'a mut F,
}

impl<'a, R: Read, F: FlashWriter> UartReceiver<'a, R, F> {
    pub fn new(uart: &'a mut R, writer: &'a mut F) -> Self {
        Self { uart, writer }
    }

    /// Program `image_size` received bytes starting at `flash_dest`, which
    /// must be erased and word aligned. Blocks until every byte arrived.
    pub fn receive_image(&mut self, flash_dest: Address, image_size: u32) -> Result<(), Error> {
        if !in_flash(flash_dest, image_size.next_multiple_of(WORD_SIZE as u32)) {
            return Err(Error::OutOfRange(flash_dest));
        }
        log::info!("receiving {} bytes into {:#x}", image_size, flash_dest);

        let mut address = flash_dest;
        let mut received = 0u32;

        self.writer.unlock();
        let result = loop {
            if received >= image_size {
                break Ok(());
            }

            let mut group = [ERASED_BYTE; WORD_SIZE];
            let take = (image_size - received).min(WORD_SIZE as u32) as usize;
            if let Err(e) = self.read_group(&mut group[..take]) {
                break Err(e);
            }

            let word = WIRE_WORD_ORDER.pack(group);
            // one word per critical section, the UART ring keeps filling in between
            if let Err(e) = critical_section::with(|_| self.writer.write_word(address, word)) {
                break Err(e);
            }

            address += WORD_SIZE as Address;
            received += take as u32;
        };
        self.writer.lock();

        match result {
            Ok(()) => log::info!("received {} bytes", received),
            Err(e) => log::error!("receive aborted after {} bytes: {}", received, e),
        }
        result
    }

    fn read_group(&mut self, group: &mut [u8]) -> Result<(), Error> {
        let mut filled = 0;
        while filled < group.len() {
            // busy poll, one byte at a time
            match self.uart.read(&mut group[filled..filled + 1]) {
                Ok(0) => continue,
                Ok(n) => filled += n,
                Err(_) => return Err(Error::Serial),
            }
        }
        Ok(())
    }
}
