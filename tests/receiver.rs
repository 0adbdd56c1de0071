/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

mod common;

use common::{firmware, in_critical_section, ByteStream, SimFlash, MAP};
use ha_ctrl_boots::image::ImageManager;
use ha_ctrl_boots::receiver::UartReceiver;
use ha_ctrl_boots::types::partition::{FLASH_END, UPDATE_IMAGE_SIZE};
use ha_ctrl_boots::types::std_crc::SoftwareCrc;
use ha_ctrl_boots::types::update_image::{build_update_image, ImageRelease};
use ha_ctrl_boots::Error;
use pretty_assertions::assert_eq;

#[test]
fn bytes_land_in_flash_in_wire_order() {
    let mut flash = SimFlash::new();
    let mut uart = ByteStream::new(vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);

    UartReceiver::new(&mut uart, &mut flash)
        .receive_image(MAP.new_app.start(), 8)
        .unwrap();

    assert_eq!(
        flash.bytes(MAP.new_app.start(), 8),
        &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
    );
    assert_eq!(flash.writes_within(MAP.new_app.start(), 8), 2);
    assert!(flash.is_locked());
}

#[test]
fn trailing_partial_word_is_padded_with_erased_bytes() {
    let mut flash = SimFlash::new();
    let mut uart = ByteStream::new(vec![1, 2, 3, 4, 5, 6]);

    UartReceiver::new(&mut uart, &mut flash)
        .receive_image(MAP.new_app.start(), 6)
        .unwrap();

    assert_eq!(
        flash.ops.last(),
        Some(&common::Op::Write(MAP.new_app.start() + 4, 0xFFFF_0605))
    );
    assert_eq!(flash.bytes(MAP.new_app.start(), 8), &[1, 2, 3, 4, 5, 6, 0xFF, 0xFF]);
}

#[test]
fn idle_polls_are_waited_out() {
    let mut flash = SimFlash::new();
    let data = firmware(401, 2);
    let mut uart = ByteStream::new(data.clone());
    uart.stutter = true;

    UartReceiver::new(&mut uart, &mut flash)
        .receive_image(MAP.new_app.start(), data.len() as u32)
        .unwrap();

    assert_eq!(uart.consumed(), data.len());
    assert_eq!(flash.bytes(MAP.new_app.start(), data.len()), &data[..]);
}

#[test]
fn link_failure_aborts_and_relocks() {
    let mut flash = SimFlash::new();
    let mut uart = ByteStream::new(vec![0xAA; 10]);

    let result = UartReceiver::new(&mut uart, &mut flash).receive_image(MAP.new_app.start(), 64);
    assert_eq!(result, Err(Error::Serial));
    assert!(flash.is_locked());
    // the complete words before the failure were programmed
    assert_eq!(flash.writes_within(MAP.new_app.start(), 64), 2);
}

#[test]
fn destination_outside_flash_is_rejected() {
    let mut flash = SimFlash::new();
    let mut uart = ByteStream::new(vec![0; 16]);

    let result = UartReceiver::new(&mut uart, &mut flash).receive_image(FLASH_END - 8, 16);
    assert_eq!(result, Err(Error::OutOfRange(FLASH_END - 8)));
    assert_eq!(uart.consumed(), 0);
    assert!(flash.ops.is_empty());
}

#[test]
fn received_update_stream_verifies_on_device() {
    let boot_sec = firmware(20_000, 0x10);
    let app = firmware(150_003, 0x20);
    let mut stream = vec![0u8; UPDATE_IMAGE_SIZE as usize];
    build_update_image(
        ImageRelease {
            firmware: &boot_sec,
            version: 0x000200,
            build_timestamp: 42,
        },
        ImageRelease {
            firmware: &app,
            version: 0x010400,
            build_timestamp: 42,
        },
        &mut stream,
    )
    .unwrap();

    let mut flash = SimFlash::new();
    let mut uart = ByteStream::new(stream);
    UartReceiver::new(&mut uart, &mut flash)
        .receive_image(MAP.new_boot_sec.start(), UPDATE_IMAGE_SIZE)
        .unwrap();

    let mut crc = SoftwareCrc::new();
    let mut images = ImageManager::new(&mut flash, &mut crc);
    assert!(images.is_image_authentic(MAP.new_boot_sec.start(), MAP.new_boot_sec.metadata()));
    assert!(images.is_image_authentic(MAP.new_app.start(), MAP.new_app.metadata()));
}

#[test]
fn every_received_word_is_programmed_with_interrupts_masked() {
    let mut flash = SimFlash::new();
    let data = firmware(1027, 0x44);
    let mut uart = ByteStream::new(data.clone());

    UartReceiver::new(&mut uart, &mut flash)
        .receive_image(MAP.new_app.start(), data.len() as u32)
        .unwrap();
    assert!(!in_critical_section());
    assert_eq!(flash.writes_within(MAP.new_app.start(), MAP.new_app.size()), 257);
    assert_eq!(flash.bytes(MAP.new_app.start(), data.len()), &data[..]);
}
