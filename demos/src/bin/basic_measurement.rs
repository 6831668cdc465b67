//! # Basic Measurement
//! This example demonstrates how to use the HCSR04 sensor to measure distance once per second.
//!
//! ## Note
//!
//! Most of the hc-sr04 sensors are rated for 5V. The Raspberry Pi Pico is a 3.3V device. While some hc-sr04 tolerate to be operated on 3.3V, it is not recommended to do so. At best the sensor will have a reduced precision.
//! When operating the sensor at 5V with a 3.3V controller like the Pi Pico, the following considerations must be taken into account:
//!
//! - The trigger pin can be directly connected to the controller. 3.3V should be enough to trigger the sensor.
//! - The echo pin must be connected to the controller through a voltage divider to reduce the voltage from 5V to 3.3V. The echo pin on the hc-sr04 will output 5V when the sensor is operated at 5V and that will then damage the controller.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{Delay, Duration, Instant, Timer};
use hcsr04_blocking::{Config, Hcsr04, Now, PinPair};
use {defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Running!");

    let trigger = Output::new(p.PIN_4, Level::Low);
    let echo = Input::new(p.PIN_5, Pull::None);

    // Create clock function that returns microseconds
    struct EmbassyClock;

    impl Now for EmbassyClock {
        fn now_micros(&self) -> u64 {
            Instant::now().as_micros()
        }
    }

    let pins = PinPair::new(trigger, echo);
    let sensor = pins.handle();
    let mut driver = Hcsr04::new(pins, EmbassyClock, Delay, Config::default());

    if let Err(e) = driver.initialize(&sensor) {
        error!("Failed to initialize HC-SR04 sensor: {}", e);
        return;
    }

    loop {
        match driver.measure(&sensor) {
            Ok(distance) => {
                info!("Distance: {} cm", distance);
            }
            Err(e) => {
                info!("Failed to measure distance: {}", e);
            }
        }
        Timer::after(Duration::from_secs(1)).await;
    }
}
