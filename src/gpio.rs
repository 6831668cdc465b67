//! Digital I/O capability consumed by the driver.
//!
//! Platforms that address pins by number (ESP-IDF, RP2040 SIO, register level code)
//! implement [`GpioPort`] directly. HALs with type-state pins can wrap an
//! [`OutputPin`] and an [`InputPin`] in a [`PinPair`] instead.

use embedded_hal::digital::{Error as _, ErrorKind, ErrorType, InputPin, OutputPin, PinState};

/// Logical identifier of a GPIO pin, as numbered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId(pub u8);

/// Direction of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// High impedance input.
    Input,
    /// Push-pull output, driven to `initial` when configured.
    Output { initial: PinState },
}

/// Internal pull resistor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
}

/// Edge interrupt selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeInterrupt {
    Disabled,
    Rising,
    Falling,
    AnyEdge,
}

/// Full configuration applied to one pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub direction: Direction,
    pub pull: Pull,
    pub interrupt: EdgeInterrupt,
}

impl PinConfig {
    /// Output without pulls or interrupts, driven to `initial`.
    pub const fn output(initial: PinState) -> Self {
        Self {
            direction: Direction::Output { initial },
            pull: Pull::None,
            interrupt: EdgeInterrupt::Disabled,
        }
    }

    /// Floating input without interrupts.
    pub const fn floating_input() -> Self {
        Self {
            direction: Direction::Input,
            pull: Pull::None,
            interrupt: EdgeInterrupt::Disabled,
        }
    }
}

/// GPIO access by pin number.
///
/// # Safety Invariants
///
/// - `read` must sample the pin without blocking
/// - `write` must take effect before it returns, the trigger pulse width depends on it
/// - No other code may reconfigure the sensor pins while the driver uses them
pub trait GpioPort: ErrorType {
    /// Configure `pin` for the given direction, pull and interrupt mode.
    fn configure(&mut self, pin: PinId, config: PinConfig) -> Result<(), Self::Error>;

    /// Drive an output pin.
    fn write(&mut self, pin: PinId, state: PinState) -> Result<(), Self::Error>;

    /// Sample the level of a pin.
    fn read(&mut self, pin: PinId) -> Result<PinState, Self::Error>;

    /// Returns `true` if `pin` currently reads high.
    fn is_high(&mut self, pin: PinId) -> Result<bool, Self::Error> {
        Ok(self.read(pin)? == PinState::High)
    }
}

impl<T: GpioPort + ?Sized> GpioPort for &mut T {
    #[inline]
    fn configure(&mut self, pin: PinId, config: PinConfig) -> Result<(), Self::Error> {
        T::configure(self, pin, config)
    }

    #[inline]
    fn write(&mut self, pin: PinId, state: PinState) -> Result<(), Self::Error> {
        T::write(self, pin, state)
    }

    #[inline]
    fn read(&mut self, pin: PinId) -> Result<PinState, Self::Error> {
        T::read(self, pin)
    }
}

const PAIR_TRIGGER: PinId = PinId(0);
const PAIR_ECHO: PinId = PinId(1);

/// A trigger [`OutputPin`] and an echo [`InputPin`] exposed as a two pin [`GpioPort`].
///
/// Direction, pulls and interrupts of type-state pins are fixed when the HAL builds them,
/// so `configure` only drives the trigger to its initial level and rejects anything other
/// than a floating, interrupt-free configuration.
pub struct PinPair<TRIG, ECHO> {
    trigger: TRIG,
    echo: ECHO,
}

impl<TRIG, ECHO> PinPair<TRIG, ECHO> {
    pub fn new(trigger: TRIG, echo: ECHO) -> Self {
        Self { trigger, echo }
    }

    /// The handle addressing these two pins.
    pub fn handle(&self) -> crate::SensorHandle {
        crate::SensorHandle::new(PAIR_TRIGGER, PAIR_ECHO)
    }

    /// Give back the wrapped pins.
    pub fn release(self) -> (TRIG, ECHO) {
        (self.trigger, self.echo)
    }
}

impl<TRIG, ECHO> ErrorType for PinPair<TRIG, ECHO> {
    type Error = ErrorKind;
}

impl<TRIG, ECHO> GpioPort for PinPair<TRIG, ECHO>
where
    TRIG: OutputPin,
    ECHO: InputPin,
{
    fn configure(&mut self, pin: PinId, config: PinConfig) -> Result<(), Self::Error> {
        if config.pull != Pull::None || config.interrupt != EdgeInterrupt::Disabled {
            return Err(ErrorKind::Other);
        }
        match (pin, config.direction) {
            (PAIR_TRIGGER, Direction::Output { initial }) => {
                self.trigger.set_state(initial).map_err(|e| e.kind())
            }
            (PAIR_ECHO, Direction::Input) => Ok(()),
            _ => Err(ErrorKind::Other),
        }
    }

    fn write(&mut self, pin: PinId, state: PinState) -> Result<(), Self::Error> {
        match pin {
            PAIR_TRIGGER => self.trigger.set_state(state).map_err(|e| e.kind()),
            _ => Err(ErrorKind::Other),
        }
    }

    fn read(&mut self, pin: PinId) -> Result<PinState, Self::Error> {
        match pin {
            PAIR_ECHO => self
                .echo
                .is_high()
                .map(PinState::from)
                .map_err(|e| e.kind()),
            _ => Err(ErrorKind::Other),
        }
    }
}
