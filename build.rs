/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use std::env;
use std::fs;
use std::path::PathBuf;

#[path = "src/types/partition.rs"]
mod partition;

use partition::*;

fn memory_x(flash_origin: u32, flash_length: u32) -> String {
    let ram_length = RAM_SIZE - SHARED_RAM_SIZE;
    format!(
        "
MEMORY
{{
    FLASH : ORIGIN = 0x{flash_origin:08x}, LENGTH = {flash_length}
    RAM : ORIGIN = 0x{RAM_START:08x}, LENGTH = {ram_length}
    SHARED_RAM : ORIGIN = 0x{SHARED_RAM_START:08x}, LENGTH = {SHARED_RAM_SIZE}
}}

_shared_ram_start = ORIGIN(SHARED_RAM);
"
    )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/types/partition.rs");

    let out = PathBuf::from(env::var("OUT_DIR").unwrap());

    // (bin name, region origin, region length without the metadata/cert footer)
    let stages = [
        ("boot-prim", BOOT_PRIM_START, BOOT_PRIM_SIZE),
        (
            "boot-sec",
            BOOT_SEC_START,
            BOOT_SEC_SIZE - IMAGE_FOOTER_SIZE,
        ),
    ];

    for (bin, origin, length) in stages {
        let dir = out.join(bin);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("memory.x"), memory_x(origin, length)).unwrap();
    }

    // host builds (tests, fwpack) must not see the cortex-m-rt linker script
    let bare_metal_arm = env::var("CARGO_CFG_TARGET_ARCH").as_deref() == Ok("arm")
        && env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none");
    if !bare_metal_arm {
        return;
    }

    for (bin, _, _) in stages {
        println!(
            "cargo:rustc-link-arg-bin={bin}=-L{}",
            out.join(bin).display()
        );
    }
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    if env::var("CARGO_FEATURE_DEFMT").is_ok() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }
}
