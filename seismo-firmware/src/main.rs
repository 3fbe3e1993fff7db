//! Seismo - Motion-Sensing Node Firmware
//!
//! Main firmware binary for the K70 tower board. Brings up the
//! interrupt-driven I2C transaction engine, probes the on-board
//! MMA8451Q accelerometer, and streams median-filtered XYZ samples
//! over defmt while the green LED beats.
//!
//! Named after the Greek "seismos" meaning "shaking" - the firmware's
//! whole job is noticing how the board moves.

#![no_std]
#![no_main]

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;
use cortex_m_rt::{entry, exception};
use defmt::{error, info, warn};
use embedded_hal::digital::StatefulOutputPin;
use {defmt_rtt as _, panic_probe as _};

use seismo_core::bus::{I2cMaster, SharedI2c};
use seismo_core::filter::Median3;
use seismo_drivers::accel::{AccelMode, Mma8451q, Sa0};
use seismo_hal_k70::i2c::I2c0;
use seismo_hal_k70::interrupt::Irq;
use seismo_hal_k70::led::Leds;

/// Module clock feeding the I2C0 controller
const MODULE_CLOCK_HZ: u32 = 24_000_000;

/// SCL rate for the sensor bus
const BUS_RATE_HZ: u32 = 100_000;

/// Crude inter-sample delay (core cycles)
const SAMPLE_DELAY_CYCLES: u32 = 12_000_000;

/// Engine handle shared between thread context and the I2C0 interrupt.
// SAFETY: the only place the controller is conjured; `I2c0::take` is
// never used in this binary.
static I2C: SharedI2c<I2c0> = SharedI2c::new(I2cMaster::new(unsafe { I2c0::steal() }));

/// All device interrupts funnel here - there is no PAC vector table.
/// The engine checks the hardware-owned pending flag itself, so being
/// called for someone else's vector is harmless.
#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    if irqn == Irq::I2c0.number() as i16 {
        I2C.on_interrupt();
    }
}

#[entry]
fn main() -> ! {
    info!("Seismo firmware starting...");

    let mut core = cortex_m::Peripherals::take().unwrap();
    let mut leds = Leds::take().unwrap();

    // Controller bring-up: pins, clocks, divider.
    let config = I2C.with(|bus| {
        bus.hardware().init_pins();
        bus.init(BUS_RATE_HZ, MODULE_CLOCK_HZ)
    });
    if let Err(e) = config {
        error!(
            "no SCL divider reaches {} Hz from {} Hz",
            e.target_hz, MODULE_CLOCK_HZ
        );
        park(&mut leds);
    }

    unsafe {
        core.NVIC.set_priority(Irq::I2c0, 0x80);
        NVIC::unmask(Irq::I2c0);
    }

    let mut accel = Mma8451q::new(&I2C, Sa0::High);
    match accel.init() {
        Ok(()) => info!("accelerometer up"),
        Err(e) => {
            error!("accelerometer init failed: {}", e);
            park(&mut leds);
        }
    }
    if let Err(e) = accel.set_mode(AccelMode::Polling) {
        error!("accelerometer mode switch failed: {}", e);
        park(&mut leds);
    }

    let mut x_filter = Median3::new();
    let mut y_filter = Median3::new();
    let mut z_filter = Median3::new();

    loop {
        cortex_m::asm::delay(SAMPLE_DELAY_CYCLES);
        let _ = leds.green.toggle();

        match accel.read_xyz() {
            Ok(sample) => {
                let x = x_filter.push(sample[0]);
                let y = y_filter.push(sample[1]);
                let z = z_filter.push(sample[2]);
                info!("accel x={=u8} y={=u8} z={=u8}", x, y, z);
            }
            Err(e) => warn!("accel read failed: {}", e),
        }
    }
}

/// Terminal error state: orange LED on, everything else stops.
fn park(leds: &mut Leds) -> ! {
    leds.orange.on();
    loop {
        cortex_m::asm::wfi();
    }
}
