/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Update-safe two stage boot core for STM32F407.
//!
//! `boot-prim` promotes a staged secondary bootloader and records a staged
//! application, then hands off to `boot-sec`. `boot-sec` optionally receives
//! a new update image over UART, promotes the staged application and hands
//! off to it. Everything in here except [`boards`] and [`handoff`] is
//! hardware independent and runs on the host against in-memory fakes.

#![cfg_attr(not(test), no_std)]

pub mod boot_flag;
pub mod error;
pub mod flash;
pub mod image;
pub mod orchestrator;
pub mod receiver;
pub mod shared;
pub mod types;

#[cfg(feature = "hw_f407_disco")]
pub mod boards;
#[cfg(feature = "hw_f407_disco")]
pub mod handoff;

pub use error::Error;

/// Address type in flash or RAM
pub type Address = u32;

#[cfg(feature = "defmt")]
pub(crate) use defmt as log;

#[cfg(not(feature = "defmt"))]
pub(crate) mod log {
    macro_rules! info {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use info;
    macro_rules! error {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use error;
    macro_rules! warner {
        ( $( $x:expr ),* $(,)? ) => {{ $( let _ = &$x; )* }};
    }
    pub(crate) use warner as warn;
}
