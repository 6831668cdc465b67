use core::fmt;

/// Errors returned by the driver.
///
/// `E` is the error type of the [`GpioPort`](crate::GpioPort) the driver was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The handle uses the same pin for trigger and echo, or the time budget is not positive.
    InvalidArgument,
    /// The echo pin was already high when the echo wait began.
    ///
    /// Either a previous measurement has not finished or the sensor is still settling.
    /// Back off before retrying.
    PriorPulseUnfinished,
    /// The echo pin did not go high within the device timeout.
    ///
    /// Usually there is no reflecting object in range, or the sensor is miswired.
    EchoStartTimeout,
    /// The echo pin stayed high longer than the caller's budget.
    ///
    /// The object is farther away than the requested maximum distance.
    EchoEndTimeout,
    /// Configuring, writing or reading a pin failed.
    Gpio(E),
}

/// The polling phase that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Timeout {
    /// Waiting for the echo rising edge.
    EchoStart,
    /// Waiting for the echo falling edge.
    EchoEnd,
}

impl<E> From<Timeout> for Error<E> {
    fn from(timeout: Timeout) -> Self {
        match timeout {
            Timeout::EchoStart => Error::EchoStartTimeout,
            Timeout::EchoEnd => Error::EchoEndTimeout,
        }
    }
}

impl<E> Error<E> {
    /// Static description of the failure, without the wrapped GPIO error.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::InvalidArgument => "Invalid sensor handle or time budget",
            Error::PriorPulseUnfinished => "Echo pin is already high",
            Error::EchoStartTimeout => "Timeout waiting for echo pin to go high",
            Error::EchoEndTimeout => "Timeout waiting for echo pin to go low",
            Error::Gpio(_) => "GPIO error",
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Gpio(e) => write!(f, "{}: {:?}", self.as_str(), e),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}
