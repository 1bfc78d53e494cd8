//! Fixed-point time arithmetic.
//!
//! All scheduler times are expressed as a signed count of microsecond ticks,
//! either as a span or as an offset from the start of the planning timeline.
//! Integer ticks keep comparisons exact under long `plus`/`minus` chains,
//! which floating-point seconds cannot guarantee.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A span of time, or a point in time measured from the start of the
/// planning timeline, counted in microseconds.
///
/// # Examples
///
/// ```
/// use skyplan_core::Duration;
///
/// let d = Duration::of_hours(1) + Duration::of_minutes(30);
/// assert_eq!(d, Duration::of_minutes(90));
/// assert!(Duration::ZERO < d);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Duration {
    micros: i64,
}

impl Duration {
    /// The zero span, also the start of the planning timeline.
    pub const ZERO: Duration = Duration { micros: 0 };

    /// The largest representable time point.
    pub const MAX: Duration = Duration { micros: i64::MAX };

    /// The smallest representable time point.
    pub const MIN: Duration = Duration { micros: i64::MIN };

    /// One microsecond, the resolution of the timeline.
    pub const EPSILON: Duration = Duration { micros: 1 };

    #[inline]
    pub const fn of_microseconds(micros: i64) -> Self {
        Duration { micros }
    }

    #[inline]
    pub const fn of_milliseconds(millis: i64) -> Self {
        Duration { micros: millis.saturating_mul(1_000) }
    }

    #[inline]
    pub const fn of_seconds(seconds: i64) -> Self {
        Duration { micros: seconds.saturating_mul(1_000_000) }
    }

    #[inline]
    pub const fn of_minutes(minutes: i64) -> Self {
        Duration { micros: minutes.saturating_mul(60_000_000) }
    }

    #[inline]
    pub const fn of_hours(hours: i64) -> Self {
        Duration { micros: hours.saturating_mul(3_600_000_000) }
    }

    /// The tick count in microseconds.
    #[inline]
    pub const fn in_microseconds(&self) -> i64 {
        self.micros
    }

    /// The whole number of seconds in this span, truncated toward zero.
    #[inline]
    pub const fn in_seconds(&self) -> i64 {
        self.micros / 1_000_000
    }

    /// Saturating addition; never wraps.
    #[inline]
    pub const fn plus(&self, other: Duration) -> Duration {
        Duration { micros: self.micros.saturating_add(other.micros) }
    }

    /// Saturating subtraction; never wraps.
    #[inline]
    pub const fn minus(&self, other: Duration) -> Duration {
        Duration { micros: self.micros.saturating_sub(other.micros) }
    }

    /// Saturating scalar multiplication.
    #[inline]
    pub const fn times(&self, scalar: i64) -> Duration {
        Duration { micros: self.micros.saturating_mul(scalar) }
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.micros < 0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.micros == 0
    }

    #[inline]
    pub fn min(self, other: Duration) -> Duration {
        if self <= other {
            self
        } else {
            other
        }
    }

    #[inline]
    pub fn max(self, other: Duration) -> Duration {
        if self >= other {
            self
        } else {
            other
        }
    }

    /// The next representable time point; saturates at [`Duration::MAX`].
    #[inline]
    pub const fn succ(&self) -> Duration {
        Duration { micros: self.micros.saturating_add(1) }
    }

    /// The previous representable time point; saturates at [`Duration::MIN`].
    #[inline]
    pub const fn pred(&self) -> Duration {
        Duration { micros: self.micros.saturating_sub(1) }
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Duration {
        self.plus(other)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, other: Duration) -> Duration {
        self.minus(other)
    }
}

impl Neg for Duration {
    type Output = Duration;

    fn neg(self) -> Duration {
        Duration { micros: self.micros.saturating_neg() }
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({}us)", self.micros)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.micros == i64::MAX {
            return write!(f, "+inf");
        }
        if self.micros == i64::MIN {
            return write!(f, "-inf");
        }
        let sign = if self.micros < 0 { "-" } else { "" };
        let abs = self.micros.unsigned_abs();
        let secs = abs / 1_000_000;
        let sub = abs % 1_000_000;
        if sub == 0 {
            write!(f, "{sign}{secs}s")
        } else {
            write!(f, "{sign}{secs}.{sub:06}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_agree() {
        assert_eq!(Duration::of_seconds(1), Duration::of_microseconds(1_000_000));
        assert_eq!(Duration::of_minutes(2), Duration::of_seconds(120));
        assert_eq!(Duration::of_hours(1), Duration::of_minutes(60));
    }

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(Duration::MAX.plus(Duration::of_seconds(1)), Duration::MAX);
        assert_eq!(Duration::MIN.minus(Duration::of_seconds(1)), Duration::MIN);
        assert_eq!(Duration::MAX.succ(), Duration::MAX);
    }

    #[test]
    fn ordering_is_total() {
        let a = Duration::of_seconds(-1);
        let b = Duration::ZERO;
        let c = Duration::of_seconds(1);
        assert!(a < b && b < c);
        assert_eq!(b.max(c), c);
        assert_eq!(b.min(a), a);
    }

    #[test]
    fn display_formats_fractions() {
        assert_eq!(Duration::of_seconds(90).to_string(), "90s");
        assert_eq!(Duration::of_microseconds(1_500_000).to_string(), "1.500000s");
        assert_eq!(Duration::MAX.to_string(), "+inf");
    }
}
