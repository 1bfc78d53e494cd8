//! Disjoint time-interval sets.
//!
//! [`TimeWindows`] is the currency of "when is this possible" throughout the
//! scheduler: constraint narrowing, goal anchoring and candidate placement
//! all trade in these sets. The container keeps its intervals disjoint and
//! ordered; in the default merging mode, abutting intervals coalesce, while
//! the non-merging mode keeps them distinct so that gap-sensitive filters can
//! see the seams.

use std::fmt;

use crate::error::{ModelError, Result};
use crate::time::Duration;

/// A closed interval `[start, end]` on the scheduling timeline.
///
/// A window with `start == end` is a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    start: Duration,
    end: Duration,
}

impl Window {
    /// Creates a window, rejecting an inverted `start > end` pair.
    pub fn between(start: Duration, end: Duration) -> Result<Window> {
        if start > end {
            return Err(ModelError::InvalidWindow { start, end });
        }
        Ok(Window { start, end })
    }

    /// Creates a single-instant window.
    pub const fn at(instant: Duration) -> Window {
        Window { start: instant, end: instant }
    }

    /// The entire representable timeline.
    pub const fn forever() -> Window {
        Window { start: Duration::ZERO, end: Duration::MAX }
    }

    #[inline]
    pub const fn start(&self) -> Duration {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> Duration {
        self.end
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.end.minus(self.start)
    }

    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn contains(&self, instant: Duration) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// The overlap of two windows, if any. Touching windows overlap in a
    /// single instant.
    pub fn intersect(&self, other: &Window) -> Option<Window> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start <= end {
            Some(Window { start, end })
        } else {
            None
        }
    }

    /// Shifts both endpoints by the given signed offsets, dropping the
    /// window if it inverts.
    pub fn shifted(&self, start_by: Duration, end_by: Duration) -> Option<Window> {
        let start = self.start.plus(start_by);
        let end = self.end.plus(end_by);
        if start <= end {
            Some(Window { start, end })
        } else {
            None
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}

/// An ordered set of disjoint closed intervals.
///
/// Two construction modes exist. In the default *merging* mode, a union with
/// a window that touches or overlaps stored intervals coalesces them all into
/// one. In *non-merging* mode ([`TimeWindows::non_merging`]), intervals that
/// merely share an endpoint stay distinct; overlapping intervals still
/// coalesce, since the set never stores an overlap.
///
/// # Examples
///
/// ```
/// use skyplan_core::{Duration, TimeWindows, Window};
///
/// let mut w = TimeWindows::new();
/// w.union(Window::between(Duration::of_seconds(0), Duration::of_seconds(5)).unwrap());
/// w.union(Window::between(Duration::of_seconds(5), Duration::of_seconds(9)).unwrap());
/// assert_eq!(w.len(), 1); // merging mode coalesced the shared endpoint
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimeWindows {
    spans: std::collections::BTreeMap<Duration, Duration>,
    merge_adjacent: bool,
}

impl PartialEq for TimeWindows {
    fn eq(&self, other: &Self) -> bool {
        self.spans == other.spans
    }
}

impl Eq for TimeWindows {}

impl TimeWindows {
    /// Creates an empty set in merging mode.
    pub fn new() -> TimeWindows {
        TimeWindows { spans: Default::default(), merge_adjacent: true }
    }

    /// Creates an empty set that keeps adjacent windows distinct.
    pub fn non_merging() -> TimeWindows {
        TimeWindows { spans: Default::default(), merge_adjacent: false }
    }

    /// Creates a set holding the single given window.
    pub fn of(window: Window) -> TimeWindows {
        let mut w = TimeWindows::new();
        w.union(window);
        w
    }

    /// Creates a set from any collection of windows.
    pub fn of_all<I: IntoIterator<Item = Window>>(windows: I) -> TimeWindows {
        let mut w = TimeWindows::new();
        for window in windows {
            w.union(window);
        }
        w
    }

    /// The entire representable timeline as a one-window set.
    pub fn forever() -> TimeWindows {
        TimeWindows::of(Window::forever())
    }

    /// Switches this set to non-merging insertion for all later unions.
    pub fn no_merge_adjacent(&mut self) {
        self.merge_adjacent = false;
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// The earliest instant covered by any window, if the set is non-empty.
    pub fn minimum(&self) -> Option<Duration> {
        self.spans.keys().next().copied()
    }

    /// The latest instant covered by any window, if the set is non-empty.
    pub fn maximum(&self) -> Option<Duration> {
        self.spans.values().next_back().copied()
    }

    pub fn first(&self) -> Option<Window> {
        self.spans.iter().next().map(|(&start, &end)| Window { start, end })
    }

    pub fn last(&self) -> Option<Window> {
        self.spans.iter().next_back().map(|(&start, &end)| Window { start, end })
    }

    /// Iterates the stored windows in increasing start order.
    pub fn iter(&self) -> impl Iterator<Item = Window> + '_ {
        self.spans.iter().map(|(&start, &end)| Window { start, end })
    }

    /// Inserts a window, coalescing everything it overlaps (and, in merging
    /// mode, everything it touches).
    pub fn union(&mut self, window: Window) {
        let mut merge_start = window.start;
        let mut merge_end = window.end;
        let mut absorbed = Vec::new();

        for (&start, &end) in &self.spans {
            if self.merge_adjacent {
                if end < window.start {
                    continue;
                }
                if start > window.end {
                    break;
                }
            } else {
                // Keep mere junctions distinct, except when the two windows
                // share a start (the map cannot hold two spans with one key).
                let overlaps = window.start < end && start < window.end;
                if !overlaps && start != window.start {
                    if start > window.end {
                        break;
                    }
                    continue;
                }
            }
            absorbed.push(start);
            merge_start = merge_start.min(start);
            merge_end = merge_end.max(end);
        }

        for start in absorbed {
            self.spans.remove(&start);
        }
        self.spans.insert(merge_start, merge_end);
    }

    /// Unions every window of another set into this one.
    pub fn union_all(&mut self, other: &TimeWindows) {
        for window in other.iter() {
            self.union(window);
        }
    }

    /// Replaces this set with its pairwise intersection against another set.
    ///
    /// With `no_instant` set, zero-length intersection results are dropped.
    pub fn intersection(&mut self, other: &TimeWindows, no_instant: bool) {
        let mine: Vec<Window> = self.iter().collect();
        let theirs: Vec<Window> = other.iter().collect();
        self.spans.clear();

        let mut j = 0;
        for a in &mine {
            // Skip windows of `other` that end before `a` begins.
            while j < theirs.len() && theirs[j].end < a.start {
                j += 1;
            }
            let mut k = j;
            while k < theirs.len() && theirs[k].start <= a.end {
                if let Some(piece) = a.intersect(&theirs[k]) {
                    if !(no_instant && piece.is_singleton()) {
                        self.union(piece);
                    }
                }
                k += 1;
            }
        }
    }

    /// Removes every instant covered by another set, computed as the
    /// intersection with the other set's complement.
    pub fn subtract(&mut self, other: &TimeWindows) {
        let mut complement = other.clone();
        complement.complement();
        self.intersection(&complement, true);
    }

    /// Inverts the set over the full timeline `[ZERO, MAX]`.
    ///
    /// Complement windows share their endpoints with the original windows;
    /// degenerate pieces at the timeline boundaries are not emitted, so the
    /// complement of a complement reproduces the original set.
    pub fn complement(&mut self) {
        let old: Vec<Window> = self.iter().collect();
        self.spans.clear();

        if old.is_empty() {
            self.spans.insert(Duration::ZERO, Duration::MAX);
            return;
        }

        let first = &old[0];
        if first.start > Duration::ZERO {
            self.spans.insert(Duration::ZERO, first.start);
        }
        for pair in old.windows(2) {
            self.spans.insert(pair[0].end, pair[1].start);
        }
        let last = &old[old.len() - 1];
        if last.end < Duration::MAX {
            self.spans.insert(last.end, Duration::MAX);
        }
    }

    /// Drops windows whose length falls outside `[min, max]`.
    pub fn filter_by_duration(&mut self, min: Option<Duration>, max: Option<Duration>) {
        self.spans.retain(|start, end| {
            let length = end.minus(*start);
            if let Some(min) = min {
                if length < min {
                    return false;
                }
            }
            if let Some(max) = max {
                if length > max {
                    return false;
                }
            }
            true
        });
    }

    /// Returns only the stored windows entirely inside the given bound.
    pub fn subset_fully_contained(&self, bound: &Window) -> TimeWindows {
        let mut out = TimeWindows { spans: Default::default(), merge_adjacent: self.merge_adjacent };
        for window in self.iter() {
            if bound.start() <= window.start && window.end <= bound.end() {
                out.spans.insert(window.start, window.end);
            }
        }
        out
    }

    /// Shortens every window by the given amounts at the front and back,
    /// dropping windows that invert. Offsets must be non-negative.
    pub fn contract_by(&mut self, front: Duration, back: Duration) {
        debug_assert!(!front.is_negative() && !back.is_negative());
        let old = std::mem::take(&mut self.spans);
        for (start, end) in old {
            let new_start = start.plus(front);
            let new_end = end.minus(back);
            if new_start <= new_end {
                self.spans.insert(new_start, new_end);
            }
        }
    }

    /// Removes the earliest window, if any.
    pub fn remove_first(&mut self) {
        if let Some(first) = self.minimum() {
            self.spans.remove(&first);
        }
    }

    /// Removes the latest window, if any.
    pub fn remove_last(&mut self) {
        if let Some((&start, _)) = self.spans.iter().next_back() {
            self.spans.remove(&start);
        }
    }

    /// True if any stored window overlaps the given one.
    pub fn intersects(&self, window: &Window) -> bool {
        self.iter().any(|w| w.intersect(window).is_some())
    }

    /// True if the given instant lies inside a stored window.
    pub fn contains(&self, instant: Duration) -> bool {
        self.spans
            .range(..=instant)
            .next_back()
            .is_some_and(|(_, &end)| end >= instant)
    }

    /// The sum of all stored window lengths.
    pub fn total_duration(&self) -> Duration {
        self.iter().fold(Duration::ZERO, |acc, w| acc.plus(w.duration()))
    }
}

impl fmt::Display for TimeWindows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for window in self.iter() {
            write!(f, "{window}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<Window> for TimeWindows {
    fn from_iter<I: IntoIterator<Item = Window>>(iter: I) -> Self {
        TimeWindows::of_all(iter)
    }
}
