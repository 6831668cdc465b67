//! # Timed Measurement
//! Measures in meters once per second and logs how long each call kept the core busy.
//!
//! The call blocks with interrupts disabled for up to the trigger pulse, the echo start
//! timeout and the echo budget. With a 2 m range that is at most about 17.6 ms.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{Delay, Duration, Instant, Timer};
use hcsr04_blocking::{Config, DistanceUnit, Hcsr04, Now, PinPair};
use {defmt_rtt as _, panic_probe as _};

/// Farthest object of interest in meters.
const MAX_DISTANCE_M: f64 = 2.0;

struct EmbassyClock;

impl Now for EmbassyClock {
    fn now_micros(&self) -> u64 {
        Instant::now().as_micros()
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    let trigger = Output::new(p.PIN_4, Level::Low);
    let echo = Input::new(p.PIN_5, Pull::None);

    let config = Config {
        distance_unit: DistanceUnit::Meters,
        max_distance: MAX_DISTANCE_M,
        ..Config::default()
    };

    let pins = PinPair::new(trigger, echo);
    let sensor = pins.handle();
    let mut driver = Hcsr04::new(pins, EmbassyClock, Delay, config);

    info!("Initializing HC-SR04 sensor...");
    unwrap!(driver.initialize(&sensor));

    let mut failures: u32 = 0;
    loop {
        let start = Instant::now();
        info!("Triggering sensor...");
        match driver.measure(&sensor) {
            Ok(distance) => {
                info!(
                    "Distance: {} m, Time: {} us",
                    distance,
                    start.elapsed().as_micros()
                );
            }
            Err(e) => {
                failures += 1;
                warn!(
                    "Failed to measure distance: {} ({} failures, {} us)",
                    e,
                    failures,
                    start.elapsed().as_micros()
                );
            }
        }
        Timer::after(Duration::from_secs(1)).await;
    }
}
