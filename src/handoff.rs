/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Control transfer into the next image.
//!
//! The next image's startup code expects power-on-reset peripheral state,
//! so everything this stage touched is put back before the jump.

use embassy_stm32::pac;

use crate::log;
use crate::shared::{SharedRam, WarmSignal};
use crate::types::partition::BOOT_SEC_START;
use crate::Address;

/// First two words of a Cortex-M image.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VectorTable {
    pub initial_sp: u32,
    pub reset: u32,
}

impl VectorTable {
    /// # Safety
    /// `base` must be a readable, word aligned flash address.
    pub unsafe fn read(base: Address) -> Self {
        let table = base as *const u32;
        Self {
            initial_sp: core::ptr::read_volatile(table),
            reset: core::ptr::read_volatile(table.add(1)),
        }
    }
}

const GPIO_RESET_MASK: u32 = 0x0000_01FF; // GPIOA..=GPIOI
const CRC_RESET_MASK: u32 = 1 << 12;
/// PLLCFGR reset value from RM0090
const PLLCFGR_RESET: u32 = 0x2400_3010;

fn quiesce_core() {
    // SAFETY: interrupts are off and this stage never uses these again
    let mut p = unsafe { cortex_m::Peripherals::steal() };

    p.SYST.disable_interrupt();
    p.SYST.disable_counter();
    p.SYST.set_reload(0);
    p.SYST.clear_current();

    for i in 0..p.NVIC.icer.len() {
        unsafe {
            p.NVIC.icer[i].write(0xFFFF_FFFF);
            p.NVIC.icpr[i].write(0xFFFF_FFFF);
        }
    }
}

fn quiesce_clocks() {
    let rcc = pac::RCC;

    rcc.cr().modify(|w| w.set_hsion(true));
    while !rcc.cr().read().hsirdy() {}

    // SYSCLK back on HSI, all prescalers at 1
    rcc.cfgr().write_value(pac::rcc::regs::Cfgr(0));

    rcc.cr().modify(|w| {
        w.set_hseon(false);
        w.set_csson(false);
        w.set_pllon(false);
    });
    while rcc.cr().read().pllrdy() {}

    rcc.cr().modify(|w| w.set_hsebyp(false));
    rcc.pllcfgr().write_value(pac::rcc::regs::Pllcfgr(PLLCFGR_RESET));
    rcc.cir().write_value(pac::rcc::regs::Cir(0));
}

fn quiesce_peripherals() {
    let rcc = pac::RCC;

    // pulse the reset lines, GPIO comes back in its reset (input/analog) state
    rcc.ahb1rstr().write_value(pac::rcc::regs::Ahb1rstr(GPIO_RESET_MASK | CRC_RESET_MASK));
    rcc.apb1rstr().write_value(pac::rcc::regs::Apb1rstr(0xFFFF_FFFF));
    rcc.apb2rstr().write_value(pac::rcc::regs::Apb2rstr(0xFFFF_FFFF));
    rcc.ahb1rstr().write_value(pac::rcc::regs::Ahb1rstr(0));
    rcc.apb1rstr().write_value(pac::rcc::regs::Apb1rstr(0));
    rcc.apb2rstr().write_value(pac::rcc::regs::Apb2rstr(0));

    let exti = pac::EXTI;
    exti.imr(0).write_value(pac::exti::regs::Lines(0));
    exti.emr(0).write_value(pac::exti::regs::Lines(0));
    exti.rtsr(0).write_value(pac::exti::regs::Lines(0));
    exti.ftsr(0).write_value(pac::exti::regs::Lines(0));
    exti.pr(0).write_value(pac::exti::regs::Lines(0xFFFF_FFFF));

    rcc.ahb1enr().write_value(pac::rcc::regs::Ahb1enr(0));
    rcc.ahb2enr().write_value(pac::rcc::regs::Ahb2enr(0));
    rcc.ahb3enr().write_value(pac::rcc::regs::Ahb3enr(0));
    rcc.apb1enr().write_value(pac::rcc::regs::Apb1enr(0));
    rcc.apb2enr().write_value(pac::rcc::regs::Apb2enr(0));
}

/// Quiesce the chip and jump into the image at `base`.
///
/// # Safety
/// `base` must hold an authentic image. Every driver of this stage is
/// dead afterwards.
pub unsafe fn jump(base: Address) -> ! {
    let vectors = VectorTable::read(base);
    log::info!(
        "jump {:#x} sp {:#x} reset {:#x}",
        base,
        vectors.initial_sp,
        vectors.reset
    );

    cortex_m::interrupt::disable();

    quiesce_core();
    quiesce_clocks();
    quiesce_peripherals();

    let p = cortex_m::Peripherals::steal();
    p.SCB.vtor.write(base);
    cortex_m::asm::dsb();
    cortex_m::asm::isb();

    // every NVIC line is masked, the next image starts with PRIMASK clear as after reset
    cortex_m::interrupt::enable();

    // loads MSP and branches to the reset vector of `base`
    cortex_m::asm::bootload(base as *const u32)
}

/// Application side: ask boot-sec for a serial update and jump into it.
///
/// # Safety
/// Same contract as [`jump`].
pub unsafe fn request_update() -> ! {
    WarmSignal::new(SharedRam).request();
    jump(BOOT_SEC_START)
}
