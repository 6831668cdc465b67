//! Simulated sensor bench for the unit tests.
//!
//! A single [`Bench`] is the GPIO port, clock and delay at the same time, so all of them
//! share one simulated microsecond timeline. Time advances only when the driver delays or
//! samples a pin, one microsecond per sample.

use crate::{GpioPort, Now, PinConfig, PinId};
use core::cell::{Cell, RefCell};
use critical_section::RawRestoreState;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, PinState};

pub const TRIGGER: PinId = PinId(4);
pub const ECHO: PinId = PinId(5);

std::thread_local! {
    static CRITICAL_SECTION_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Critical section that only counts nesting, per test thread.
struct CountingCriticalSection;
critical_section::set_impl!(CountingCriticalSection);

unsafe impl critical_section::Impl for CountingCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        CRITICAL_SECTION_DEPTH.with(|depth| depth.set(depth.get() + 1));
    }

    unsafe fn release(_state: RawRestoreState) {
        CRITICAL_SECTION_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// How many critical sections the current test thread is inside.
pub fn critical_section_depth() -> u32 {
    CRITICAL_SECTION_DEPTH.with(|depth| depth.get())
}

/// How the simulated sensor answers a trigger pulse.
#[derive(Debug, Clone, Copy)]
pub enum Echo {
    /// Never raises the echo.
    Silent,
    /// Echo is high from the start and never falls.
    StuckHigh,
    /// Echo rises `delay_us` after the trigger falls and stays high for `width_us`.
    /// The sample exactly `width_us` after the rise still reads high. `None` never falls.
    Pulse {
        delay_us: u64,
        width_us: Option<u64>,
    },
}

/// A level change written to the trigger pin.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub at: u64,
    pub level: PinState,
    pub critical_section_depth: u32,
}

pub struct Bench {
    response: Echo,
    time: Cell<u64>,
    trigger: Cell<PinState>,
    /// Current echo window as (rise, last high sample).
    window: Cell<Option<(u64, Option<u64>)>>,
    edges: RefCell<Vec<Edge>>,
    configured: RefCell<Vec<(PinId, PinConfig)>>,
    fail_writes: Cell<bool>,
}

impl Bench {
    pub fn new(response: Echo) -> Self {
        let window = match response {
            Echo::StuckHigh => Some((0, None)),
            _ => None,
        };
        Self {
            response,
            time: Cell::new(1_000),
            trigger: Cell::new(PinState::High),
            window: Cell::new(window),
            edges: RefCell::new(Vec::new()),
            configured: RefCell::new(Vec::new()),
            fail_writes: Cell::new(false),
        }
    }

    pub fn now(&self) -> u64 {
        self.time.get()
    }

    pub fn trigger_level(&self) -> PinState {
        self.trigger.get()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.edges.borrow().clone()
    }

    pub fn configured(&self) -> Vec<(PinId, PinConfig)> {
        self.configured.borrow().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    fn advance(&self, us: u64) {
        self.time.set(self.time.get() + us);
    }

    fn echo_level(&self, at: u64) -> PinState {
        match self.window.get() {
            Some((rise, end)) if at >= rise && end.map_or(true, |end| at <= end) => PinState::High,
            _ => PinState::Low,
        }
    }

    /// The sensor starts a new echo on a falling trigger edge unless one is still running.
    fn on_trigger_fall(&self, at: u64) {
        if self.echo_level(at) == PinState::High {
            return;
        }
        if let Echo::Pulse { delay_us, width_us } = self.response {
            let rise = at + delay_us;
            self.window.set(Some((rise, width_us.map(|width| rise + width))));
        }
    }
}

impl ErrorType for &Bench {
    type Error = ErrorKind;
}

impl GpioPort for &Bench {
    fn configure(&mut self, pin: PinId, config: PinConfig) -> Result<(), Self::Error> {
        if let crate::Direction::Output { initial } = config.direction {
            if pin == TRIGGER {
                self.trigger.set(initial);
            }
        }
        self.configured.borrow_mut().push((pin, config));
        Ok(())
    }

    fn write(&mut self, pin: PinId, state: PinState) -> Result<(), Self::Error> {
        if pin != TRIGGER || self.fail_writes.get() {
            return Err(ErrorKind::Other);
        }
        let at = self.now();
        let previous = self.trigger.replace(state);
        self.edges.borrow_mut().push(Edge {
            at,
            level: state,
            critical_section_depth: critical_section_depth(),
        });
        if previous == PinState::High && state == PinState::Low {
            self.on_trigger_fall(at);
        }
        Ok(())
    }

    fn read(&mut self, pin: PinId) -> Result<PinState, Self::Error> {
        if pin != ECHO {
            return Err(ErrorKind::Other);
        }
        let level = self.echo_level(self.now());
        self.advance(1);
        Ok(level)
    }
}

impl Now for Bench {
    fn now_micros(&self) -> u64 {
        self.now()
    }
}

impl DelayNs for &Bench {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns.div_ceil(1_000)));
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(u64::from(us));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pulse_follows_trigger_fall() {
        let bench = Bench::new(Echo::Pulse {
            delay_us: 5,
            width_us: Some(3),
        });
        let mut port = &bench;
        port.write(TRIGGER, PinState::Low).unwrap();
        let fell = bench.now();

        let levels: Vec<PinState> = (0..10).map(|_| port.read(ECHO).unwrap()).collect();
        assert_eq!(bench.now(), fell + 10);
        assert_eq!(
            levels,
            [
                PinState::Low,
                PinState::Low,
                PinState::Low,
                PinState::Low,
                PinState::Low,
                PinState::High,
                PinState::High,
                PinState::High,
                PinState::High,
                PinState::Low,
            ]
        );
    }

    #[test]
    fn busy_sensor_ignores_trigger() {
        let bench = Bench::new(Echo::StuckHigh);
        let mut port = &bench;
        port.write(TRIGGER, PinState::Low).unwrap();
        port.write(TRIGGER, PinState::High).unwrap();
        port.write(TRIGGER, PinState::Low).unwrap();
        assert_eq!(port.read(ECHO), Ok(PinState::High));
    }

    #[test]
    fn delay_advances_time() {
        let bench = Bench::new(Echo::Silent);
        let mut delay = &bench;
        delay.delay_us(10);
        delay.delay_ns(1);
        assert_eq!(bench.now(), 1_011);
    }

    #[test]
    fn critical_section_depth_counts_nesting() {
        assert_eq!(critical_section_depth(), 0);
        critical_section::with(|_| {
            assert_eq!(critical_section_depth(), 1);
        });
        assert_eq!(critical_section_depth(), 0);
    }
}
