//! # hcsr04-blocking
//!
//! This crate provides a blocking, busy-polling driver for the HC-SR04 ultrasonic distance sensor.
//!
//! The driver emits the 10 us trigger pulse, times the echo pulse on the echo pin and converts the
//! elapsed time to centimeters or meters. The whole exchange runs inside a critical section, so
//! neither interrupts nor the scheduler can stretch the trigger pulse or the measured echo.
//!
//! Every measurement has three distinct failure windows:
//!
//! - the echo line is already high when the measurement starts ([`Error::PriorPulseUnfinished`]),
//! - the sensor does not start its echo within the device timeout, 6000 us by default
//!   ([`Error::EchoStartTimeout`]),
//! - the echo lasts longer than the budget derived from the caller's maximum distance
//!   ([`Error::EchoEndTimeout`]).
//!
//! Failures are returned, never retried. Whether and when to retry is up to the caller.
//!
//! ## Platform requirements
//!
//! - a [`GpioPort`], or two `embedded-hal` pins wrapped in a [`PinPair`]
//! - a monotonic microsecond clock implementing [`Now`]
//! - a blocking [`DelayNs`] that does not yield
//! - a `critical-section` implementation, usually provided by the HAL or by
//!   `cortex-m/critical-section-single-core`
//!
//! ## Features
//!
//! - `defmt`: log initialization, measurements and failures with `defmt` and derive
//!   `defmt::Format` on the public types.
//!
//! # Example
//!
//! ```rust, ignore
//! #![no_std]
//! #![no_main]
//!
//! use defmt::*;
//! use embassy_executor::Spawner;
//! use embassy_rp::gpio::{Input, Level, Output, Pull};
//! use embassy_time::{Delay, Duration, Instant, Timer};
//! use hcsr04_blocking::{Config, Hcsr04, Now, PinPair};
//! use {defmt_rtt as _, panic_probe as _};
//!
//! #[embassy_executor::main]
//! async fn main(_spawner: Spawner) {
//!     let p = embassy_rp::init(Default::default());
//!     info!("Running!");
//!
//!     let trigger = Output::new(p.PIN_13, Level::Low);
//!     let echo = Input::new(p.PIN_28, Pull::None);
//!
//!     // Create clock function that returns microseconds
//!     struct EmbassyClock;
//!
//!     impl Now for EmbassyClock {
//!         fn now_micros(&self) -> u64 {
//!             Instant::now().as_micros()
//!         }
//!     }
//!
//!     let pins = PinPair::new(trigger, echo);
//!     let sensor = pins.handle();
//!     let mut driver = Hcsr04::new(pins, EmbassyClock, Delay, Config::default());
//!     unwrap!(driver.initialize(&sensor));
//!
//!     loop {
//!         match driver.measure_centimeters(&sensor, 200.0) {
//!             Ok(distance) => info!("Distance: {} cm", distance),
//!             Err(e) => info!("Error: {}", e.as_str()),
//!         }
//!         Timer::after(Duration::from_secs(1)).await;
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod clock;
mod error;
mod gpio;
mod units;

#[cfg(test)]
mod sim;

pub use clock::{poll_until, Now};
pub use error::{Error, Timeout};
pub use gpio::{Direction, EdgeInterrupt, GpioPort, PinConfig, PinId, PinPair, Pull};
pub use units::{to_centimeters, to_meters, DistanceUnit, ECHO_US_PER_CM, ECHO_US_PER_M};

use embedded_hal::{delay::DelayNs, digital::PinState};

/// How long the sensor may take to raise its echo after the trigger pulse, in microseconds.
pub const ECHO_START_TIMEOUT_US: u32 = 6_000;

/// Width of the trigger pulse in microseconds.
pub const TRIGGER_PULSE_US: u32 = 10;

/// Rated range of the HC-SR04 in centimeters.
pub const MAX_RANGE_CM: f64 = 400.0;

/// The configuration for the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Unit returned by [`Hcsr04::measure`].
    pub distance_unit: DistanceUnit,
    /// Farthest distance [`Hcsr04::measure`] waits for, in `distance_unit`.
    pub max_distance: f64,
    /// Device timeout for the echo to start. Independent of the distance budget.
    pub echo_start_timeout_us: u32,
    /// Width of the trigger pulse.
    pub trigger_pulse_us: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            distance_unit: DistanceUnit::Centimeters,
            max_distance: MAX_RANGE_CM,
            echo_start_timeout_us: ECHO_START_TIMEOUT_US,
            trigger_pulse_us: TRIGGER_PULSE_US,
        }
    }
}

/// Identifies one physical sensor by its trigger and echo pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorHandle {
    trigger_pin: PinId,
    echo_pin: PinId,
}

impl SensorHandle {
    pub const fn new(trigger_pin: PinId, echo_pin: PinId) -> Self {
        Self {
            trigger_pin,
            echo_pin,
        }
    }

    pub const fn trigger_pin(&self) -> PinId {
        self.trigger_pin
    }

    pub const fn echo_pin(&self) -> PinId {
        self.echo_pin
    }

    /// Trigger and echo must be different pins.
    pub fn is_valid(&self) -> bool {
        self.trigger_pin != self.echo_pin
    }
}

/// The HC-SR04 ultrasonic distance sensor driver.
///
/// # Note
///
/// A sensor must not be measured from two contexts at the same time. The critical section only
/// protects a single measurement against preemption, it does not serialize callers.
pub struct Hcsr04<GPIO, CLOCK, DELAY> {
    gpio: GPIO,
    clock: CLOCK,
    delay: DELAY,
    config: Config,
}

impl<GPIO, CLOCK, DELAY> Hcsr04<GPIO, CLOCK, DELAY>
where
    GPIO: GpioPort,
    CLOCK: Now,
    DELAY: DelayNs,
{
    /// Create a new driver.
    /// Requires the GPIO port the sensor is wired to. Pass `&mut port` to keep using the port elsewhere.
    /// Requires a clock that will provide the time in microseconds via the `Now` trait.
    /// Requires a blocking delay, used for the trigger pulse.
    pub fn new(gpio: GPIO, clock: CLOCK, delay: DELAY, config: Config) -> Self {
        Self {
            gpio,
            clock,
            delay,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Give back the GPIO port, clock and delay.
    pub fn release(self) -> (GPIO, CLOCK, DELAY) {
        (self.gpio, self.clock, self.delay)
    }

    /// Configure the sensor pins: trigger as a low output, echo as a floating input, both
    /// without pulls or edge interrupts.
    ///
    /// Call once per sensor before measuring. Calling it again applies the same configuration.
    pub fn initialize(&mut self, sensor: &SensorHandle) -> Result<(), Error<GPIO::Error>> {
        if !sensor.is_valid() {
            return Err(Error::InvalidArgument);
        }
        self.gpio
            .configure(sensor.trigger_pin, PinConfig::output(PinState::Low))
            .map_err(Error::Gpio)?;
        self.gpio
            .configure(sensor.echo_pin, PinConfig::floating_input())
            .map_err(Error::Gpio)?;
        info!(
            "HC-SR04 initialized on trigger pin {}, echo pin {}",
            sensor.trigger_pin.0,
            sensor.echo_pin.0
        );
        Ok(())
    }

    /// Trigger the sensor and return the echo pulse width in microseconds.
    ///
    /// `max_echo_time_us` bounds how long the echo may stay high, i.e. the farthest distance of
    /// interest. It must be positive. Waiting for the echo to start is bounded separately by
    /// [`Config::echo_start_timeout_us`].
    ///
    /// Blocks for at most the trigger pulse, the device timeout and `max_echo_time_us`, with
    /// interrupts disabled for the whole time.
    pub fn measure_raw(
        &mut self,
        sensor: &SensorHandle,
        max_echo_time_us: u32,
    ) -> Result<u32, Error<GPIO::Error>> {
        if !sensor.is_valid() || max_echo_time_us == 0 {
            return Err(Error::InvalidArgument);
        }

        trace!("Triggering HC-SR04 on pin {}", sensor.trigger_pin.0);
        let result = critical_section::with(|_cs| self.timed_exchange(sensor, max_echo_time_us));

        match &result {
            Ok(elapsed) => debug!("Echo pulse {} us", elapsed),
            Err(e) => warn!("HC-SR04 measurement failed: {}", e.as_str()),
        }
        result
    }

    /// Measure the distance in `unit`, waiting for objects up to `max_distance` away.
    pub fn measure_distance(
        &mut self,
        sensor: &SensorHandle,
        max_distance: f64,
        unit: DistanceUnit,
    ) -> Result<f64, Error<GPIO::Error>> {
        let budget = unit
            .echo_time_for(max_distance)
            .ok_or(Error::InvalidArgument)?;
        let elapsed = self.measure_raw(sensor, budget)?;
        Ok(unit.from_echo_time(elapsed))
    }

    /// Measure the distance in centimeters, waiting for objects up to `max_distance_cm` away.
    pub fn measure_centimeters(
        &mut self,
        sensor: &SensorHandle,
        max_distance_cm: f64,
    ) -> Result<f64, Error<GPIO::Error>> {
        self.measure_distance(sensor, max_distance_cm, DistanceUnit::Centimeters)
    }

    /// Measure the distance in meters, waiting for objects up to `max_distance_m` away.
    pub fn measure_meters(
        &mut self,
        sensor: &SensorHandle,
        max_distance_m: f64,
    ) -> Result<f64, Error<GPIO::Error>> {
        self.measure_distance(sensor, max_distance_m, DistanceUnit::Meters)
    }

    /// Measure the distance in the unit and up to the maximum distance set in the config.
    pub fn measure(&mut self, sensor: &SensorHandle) -> Result<f64, Error<GPIO::Error>> {
        let Config {
            distance_unit,
            max_distance,
            ..
        } = self.config;
        self.measure_distance(sensor, max_distance, distance_unit)
    }

    /// The timed part of a measurement. Must run inside a critical section.
    fn timed_exchange(
        &mut self,
        sensor: &SensorHandle,
        max_echo_time_us: u32,
    ) -> Result<u32, Error<GPIO::Error>> {
        let Self {
            gpio,
            clock,
            delay,
            config,
        } = self;
        let echo = sensor.echo_pin;

        gpio.write(sensor.trigger_pin, PinState::High)
            .map_err(Error::Gpio)?;
        delay.delay_us(config.trigger_pulse_us);
        gpio.write(sensor.trigger_pin, PinState::Low)
            .map_err(Error::Gpio)?;

        if gpio.is_high(echo).map_err(Error::Gpio)? {
            return Err(Error::PriorPulseUnfinished);
        }

        let triggered = clock.now_micros();
        let rising = poll_until(
            &*clock,
            triggered.saturating_add(config.echo_start_timeout_us.into()),
            Timeout::EchoStart,
            |_| -> Result<bool, Error<GPIO::Error>> { gpio.is_high(echo).map_err(Error::Gpio) },
        )?;

        let mut last_high = rising;
        poll_until(
            &*clock,
            rising.saturating_add(max_echo_time_us.into()),
            Timeout::EchoEnd,
            |now| -> Result<bool, Error<GPIO::Error>> {
                let high = gpio.is_high(echo).map_err(Error::Gpio)?;
                if high {
                    last_high = now;
                }
                Ok(!high)
            },
        )?;

        u32::try_from(last_high.saturating_sub(rising)).map_err(|_| Error::EchoEndTimeout)
    }
}
