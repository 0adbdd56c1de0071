/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Host tool sealing firmware binaries with boot metadata.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand, ValueEnum};
use ha_ctrl_boots::types::flash_layout::{ImageSlot, PARTITION_MAP};
use ha_ctrl_boots::types::metadata::Metadata;
use ha_ctrl_boots::types::partition::UPDATE_IMAGE_SIZE;
use ha_ctrl_boots::types::update_image::{build_update_image, seal_region, ImageRelease};

#[derive(Parser)]
#[command(name = "fwpack")]
#[command(about = "Seal boot-sec / application images and build update streams", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Slot {
    BootSec,
    App,
}

impl Slot {
    fn image_slot(self) -> ImageSlot {
        match self {
            Slot::BootSec => PARTITION_MAP.boot_sec,
            Slot::App => PARTITION_MAP.app,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Seal one binary into a full region image, flashable at the region base
    Region {
        /// Region the binary is linked for
        #[arg(value_enum)]
        slot: Slot,

        /// Raw firmware binary
        input: PathBuf,

        /// Output region image
        output: PathBuf,

        /// Packed version 0x00MMmmpp
        #[arg(short, long, value_parser = parse_u32, default_value = "0")]
        version: u32,

        /// Build timestamp, defaults to now
        #[arg(short, long, value_parser = parse_u32)]
        timestamp: Option<u32>,
    },
    /// Build the combined stream boot-sec receives over UART
    Update {
        /// Raw boot-sec binary
        boot_sec: PathBuf,

        /// Raw application binary
        app: PathBuf,

        /// Output update stream
        output: PathBuf,

        #[arg(long, value_parser = parse_u32, default_value = "0")]
        boot_sec_version: u32,

        #[arg(long, value_parser = parse_u32, default_value = "0")]
        app_version: u32,

        /// Build timestamp, defaults to now
        #[arg(short, long, value_parser = parse_u32)]
        timestamp: Option<u32>,
    },
}

fn parse_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<u32>().map_err(|e| e.to_string())
    }
}

fn now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

fn describe(name: &str, metadata: &Metadata) {
    let (major, minor, patch) = metadata.semver();
    println!(
        "{name}: {} bytes, crc {:#010x}, v{major}.{minor}.{patch}",
        metadata.firmware_size, metadata.firmware_crc
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Region {
            slot,
            input,
            output,
            version,
            timestamp,
        } => {
            let slot = slot.image_slot();
            let firmware = std::fs::read(&input)?;
            let mut region = vec![0u8; slot.size() as usize];

            let metadata = seal_region(
                &slot,
                &firmware,
                version,
                timestamp.unwrap_or_else(now),
                &mut region,
            )?;
            describe(&input.display().to_string(), &metadata);

            std::fs::write(&output, &region)?;
            println!(
                "Region image for {:#010x}: {}",
                slot.start(),
                output.display()
            );

            Ok(())
        }
        Commands::Update {
            boot_sec,
            app,
            output,
            boot_sec_version,
            app_version,
            timestamp,
        } => {
            let timestamp = timestamp.unwrap_or_else(now);
            let boot_sec_bin = std::fs::read(&boot_sec)?;
            let app_bin = std::fs::read(&app)?;
            let mut stream = vec![0u8; UPDATE_IMAGE_SIZE as usize];

            let (sec_meta, app_meta) = build_update_image(
                ImageRelease {
                    firmware: &boot_sec_bin,
                    version: boot_sec_version,
                    build_timestamp: timestamp,
                },
                ImageRelease {
                    firmware: &app_bin,
                    version: app_version,
                    build_timestamp: timestamp,
                },
                &mut stream,
            )?;
            describe("boot-sec", &sec_meta);
            describe("app", &app_meta);

            std::fs::write(&output, &stream)?;
            println!(
                "Update stream ({} bytes): {}",
                stream.len(),
                output.display()
            );

            Ok(())
        }
    }
}
