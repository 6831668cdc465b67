//! Conversion between echo time and distance.
//!
//! Sound travels at roughly 343 m/s, so the echo needs about 58 us per centimeter
//! of distance (out and back). Every conversion is derived from that one constant.

use libm::round;

/// Round trip echo time per centimeter of distance, in microseconds.
pub const ECHO_US_PER_CM: f64 = 58.0;

/// Round trip echo time per meter of distance, in microseconds.
pub const ECHO_US_PER_M: f64 = ECHO_US_PER_CM * 100.0;

/// The distance unit to use for measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DistanceUnit {
    Centimeters,
    Meters,
}

impl DistanceUnit {
    /// Round trip echo time for one unit of distance, in microseconds.
    pub const fn echo_us_per_unit(self) -> f64 {
        match self {
            DistanceUnit::Centimeters => ECHO_US_PER_CM,
            DistanceUnit::Meters => ECHO_US_PER_M,
        }
    }

    /// Distance covered by an echo of `elapsed_us`.
    pub fn from_echo_time(self, elapsed_us: u32) -> f64 {
        elapsed_us as f64 / self.echo_us_per_unit()
    }

    /// Echo time budget for objects up to `distance` away, rounded to the nearest microsecond.
    ///
    /// Returns `None` if `distance` is not a positive finite number or the budget does not
    /// fit in a `u32`.
    pub fn echo_time_for(self, distance: f64) -> Option<u32> {
        if !distance.is_finite() || distance <= 0.0 {
            return None;
        }
        let us = round(distance * self.echo_us_per_unit());
        if us < 1.0 || us > u32::MAX as f64 {
            return None;
        }
        Some(us as u32)
    }
}

/// Distance in centimeters covered by an echo of `elapsed_us`.
pub fn to_centimeters(elapsed_us: u32) -> f64 {
    DistanceUnit::Centimeters.from_echo_time(elapsed_us)
}

/// Distance in meters covered by an echo of `elapsed_us`.
pub fn to_meters(elapsed_us: u32) -> f64 {
    DistanceUnit::Meters.from_echo_time(elapsed_us)
}
