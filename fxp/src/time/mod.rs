//! Time primitives.
//!
//! [`Tick`] is a monotonic microsecond timestamp supplied by the platform
//! clock. Bounded hardware polling goes through [`spin_until`].

pub mod timeout;

use core::time::Duration;

use crate::platform::Clock;

/// Monotonic timestamp in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(pub u64);

impl Tick {
    #[inline]
    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    #[inline]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Time elapsed since `earlier`, zero if the clock appears to run backwards.
    pub fn saturating_duration_since(self, earlier: Tick) -> Duration {
        Duration::from_micros(self.0.saturating_sub(earlier.0))
    }

    pub fn saturating_add(self, d: Duration) -> Tick {
        let us = u64::try_from(d.as_micros()).unwrap_or(u64::MAX);
        Tick(self.0.saturating_add(us))
    }
}

/// Poll `done` until it returns true or `timeout` has elapsed.
///
/// `done` is evaluated once more after the deadline so a condition that
/// became true while the clock advanced is not reported as a timeout.
///
/// # Returns
/// `true` if the condition was observed.
pub fn spin_until<P, F>(p: &mut P, timeout: Duration, mut done: F) -> bool
where
    P: Clock + ?Sized,
    F: FnMut(&mut P) -> bool,
{
    let start = p.now();
    loop {
        if done(p) {
            return true;
        }
        if p.now().saturating_duration_since(start) >= timeout {
            return done(p);
        }
        core::hint::spin_loop();
    }
}
