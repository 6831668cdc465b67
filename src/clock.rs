use crate::Timeout;

/// Monotonic microsecond clock.
pub trait Now {
    /// The time elapsed since startup in microseconds.
    ///
    /// Must not wrap during a measurement.
    fn now_micros(&self) -> u64;
}

impl<T: Now + ?Sized> Now for &T {
    #[inline]
    fn now_micros(&self) -> u64 {
        T::now_micros(self)
    }
}

/// Busy-poll `sample` until it returns `true` or the clock passes `deadline`.
///
/// `sample` gets the timestamp taken right before it runs. On success that timestamp is
/// returned. Once a sample taken after `deadline` is still unsatisfied, `timeout` is
/// returned as the error. Errors from `sample` end the loop unchanged.
///
/// Never yields, so the loop is as precise as the clock and `sample` allow.
pub fn poll_until<C, E, F>(clock: &C, deadline: u64, timeout: Timeout, mut sample: F) -> Result<u64, E>
where
    C: Now + ?Sized,
    E: From<Timeout>,
    F: FnMut(u64) -> Result<bool, E>,
{
    loop {
        let now = clock.now_micros();
        if sample(now)? {
            return Ok(now);
        }
        if now > deadline {
            return Err(timeout.into());
        }
    }
}
