//! External state abstraction.
//!
//! The scheduler never computes resource values itself; it reads them from an
//! external simulation. [`ExternalState`] is the seam: a value history that
//! can be sampled at a point and searched for the windows where a predicate
//! holds. Every `when_value_*` query returns a subset of the windows it was
//! given, which is what lets constraint narrowing short-circuit.

use crate::error::Result;
use crate::time::Duration;
use crate::value::Value;
use crate::windows::TimeWindows;

/// A read-only view of one simulated resource's value history.
pub trait ExternalState: std::fmt::Debug {
    /// The resource's value at the given time, if the history covers it.
    fn value_at(&self, time: Duration) -> Option<Value>;

    /// Windows within `windows` where the value is strictly above `value`.
    fn when_value_above(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows>;

    /// Windows within `windows` where the value is strictly below `value`.
    fn when_value_below(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows>;

    /// Windows within `windows` where `low <= value <= high`.
    fn when_value_between(
        &self,
        low: &Value,
        high: &Value,
        windows: &TimeWindows,
    ) -> Result<TimeWindows>;

    /// Windows within `windows` where the value equals `value`.
    fn when_value_equal(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows>;

    /// Windows within `windows` where the value differs from `value`.
    fn when_value_not_equal(&self, value: &Value, windows: &TimeWindows) -> Result<TimeWindows>;
}
