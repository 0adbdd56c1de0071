/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Hardware initialization code for STM32F4-Discovery (STM32F407VG)
//! LEDs follow the board user manual UM1472: PD12 green, PD13 orange,
//! PD14 red, PD15 blue. The update link is USART2 on PA2 (TX) / PA3 (RX).

use embassy_stm32::crc::Crc;
use embassy_stm32::flash::Flash;
use embassy_stm32::gpio::{Level, Output, Pin, Speed};
use embassy_stm32::usart::BufferedUart;
use embassy_stm32::{bind_interrupts, peripherals};

use super::{Hardware, HardwareCrc, Led, Stm32FlashWriter};
use crate::orchestrator::Indicators;

bind_interrupts!(struct Irqs {
    USART2 => embassy_stm32::usart::BufferedInterruptHandler<peripherals::USART2>;
});

static mut UART_RX_BUF: [u8; 1024] = [0u8; 1024];
static mut UART_TX_BUF: [u8; 64] = [0u8; 64];

fn led(pin: impl Pin) -> Led {
    Output::new(pin.degrade(), Level::Low, Speed::Low)
}

pub fn hardware_specific_init(p: embassy_stm32::Peripherals) -> Hardware {
    // USART2 for update delivery, taken once at boot
    let usart_rx_buf = unsafe { &mut *core::ptr::addr_of_mut!(UART_RX_BUF) };
    let usart_tx_buf = unsafe { &mut *core::ptr::addr_of_mut!(UART_TX_BUF) };

    let usart2_config = {
        let mut ret = embassy_stm32::usart::Config::default();
        ret.baudrate = 115200;
        ret.assume_noise_free = false;
        ret.detect_previous_overrun = true;
        ret
    };

    let uart = BufferedUart::new(
        p.USART2,
        Irqs,
        p.PA3,
        p.PA2,
        usart_tx_buf,
        usart_rx_buf,
        usart2_config,
    )
    .unwrap_or_else(|_| panic!());

    let mut heartbeat = led(p.PD12);
    heartbeat.set_high();

    Hardware {
        flash: Stm32FlashWriter::new(Flash::new_blocking(p.FLASH)),
        crc: HardwareCrc::new(Crc::new(p.CRC)),
        uart,
        heartbeat,
        leds: Indicators {
            promoted: led(p.PD15),
            staged: led(p.PD13),
            fault: led(p.PD14),
        },
        delay: embassy_time::Delay,
    }
}
