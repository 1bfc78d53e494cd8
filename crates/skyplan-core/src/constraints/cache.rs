//! Memoization of state-constraint satisfaction.
//!
//! Evaluating a state constraint means scanning a simulated resource
//! history, and the solver asks the same questions over overlapping window
//! sets many times per goal. The cache remembers, per time interval, whether
//! the constraint held, so only genuinely new stretches of the timeline hit
//! the underlying state query.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::time::Duration;
use crate::windows::{TimeWindows, Window};

/// Tri-state satisfaction of a constraint over one cached interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    end: Duration,
    validity: Validity,
}

/// An ordered map from interval start to tri-state validity.
///
/// The segments always tile the entire timeline `[ZERO, MAX]` exactly: no
/// gaps, no overlaps. A fresh cache is a single `Unknown` segment; queries
/// progressively split `Unknown` stretches into resolved `True`/`False`
/// pieces by delegating to the constraint's underlying fetch.
#[derive(Debug, Clone)]
pub struct ValidityCache {
    segments: BTreeMap<Duration, Segment>,
}

impl Default for ValidityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidityCache {
    /// Creates a cache that knows nothing yet.
    pub fn new() -> ValidityCache {
        let mut segments = BTreeMap::new();
        segments.insert(Duration::ZERO, Segment { end: Duration::MAX, validity: Validity::Unknown });
        ValidityCache { segments }
    }

    /// The satisfied subset of `query`, resolving unknown stretches through
    /// `fetch`.
    ///
    /// `fetch` receives a sub-interval of `query` and must return the
    /// windows within it where the constraint holds; everything else in that
    /// sub-interval is recorded as unsatisfied.
    pub fn find_windows(
        &mut self,
        query: &Window,
        fetch: &mut dyn FnMut(&Window) -> Result<TimeWindows>,
    ) -> Result<TimeWindows> {
        let mut result = TimeWindows::new();
        let mut removals: Vec<Duration> = Vec::new();
        let mut insertions: Vec<(Duration, Segment)> = Vec::new();

        let query_start = query.start().max(Duration::ZERO);
        let first_key = self
            .segments
            .range(..=query_start)
            .next_back()
            .map(|(&k, _)| k)
            .unwrap_or(Duration::ZERO);

        let overlapping: Vec<(Duration, Segment)> = self
            .segments
            .range(first_key..)
            .take_while(|(&start, _)| start <= query.end())
            .map(|(&start, &segment)| (start, segment))
            .collect();

        for (start, segment) in overlapping {
            if segment.end < query_start {
                continue;
            }
            let ov_start = start.max(query_start);
            let ov_end = segment.end.min(query.end());
            if ov_start > ov_end {
                continue;
            }
            match segment.validity {
                Validity::True => {
                    result.union(Window::between(ov_start, ov_end)?);
                }
                Validity::False => {}
                Validity::Unknown => {
                    let span = Window::between(ov_start, ov_end)?;
                    let fetched = fetch(&span)?;
                    let pieces: Vec<Window> =
                        fetched.iter().filter_map(|w| w.intersect(&span)).collect();
                    for piece in &pieces {
                        result.union(*piece);
                    }

                    removals.push(start);
                    if start < ov_start {
                        insertions.push((
                            start,
                            Segment { end: ov_start.pred(), validity: Validity::Unknown },
                        ));
                    }
                    let mut cursor = ov_start;
                    let mut covered_to_end = false;
                    for piece in &pieces {
                        if piece.start() > cursor {
                            insertions.push((
                                cursor,
                                Segment { end: piece.start().pred(), validity: Validity::False },
                            ));
                        }
                        insertions.push((
                            piece.start(),
                            Segment { end: piece.end(), validity: Validity::True },
                        ));
                        if piece.end() >= ov_end {
                            covered_to_end = true;
                            break;
                        }
                        cursor = piece.end().succ();
                    }
                    if !covered_to_end && cursor <= ov_end {
                        insertions.push((cursor, Segment { end: ov_end, validity: Validity::False }));
                    }
                    if segment.end > ov_end {
                        insertions.push((
                            ov_end.succ(),
                            Segment { end: segment.end, validity: Validity::Unknown },
                        ));
                    }
                }
            }
        }

        for start in removals {
            let _ = self.segments.remove(&start);
        }
        for (start, segment) in insertions {
            let _ = self.segments.insert(start, segment);
        }
        debug_assert!(self.is_complete_tiling());

        Ok(result)
    }

    /// The cached validity at a single instant.
    pub fn validity_at(&self, instant: Duration) -> Validity {
        self.segments
            .range(..=instant)
            .next_back()
            .filter(|(_, segment)| segment.end >= instant)
            .map(|(_, segment)| segment.validity)
            .unwrap_or(Validity::Unknown)
    }

    /// The number of cached segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Whether the segments exactly tile `[ZERO, MAX]`: the structural
    /// invariant of the cache.
    pub fn is_complete_tiling(&self) -> bool {
        let mut expected = Duration::ZERO;
        for (&start, segment) in &self.segments {
            if start != expected || segment.end < start {
                return false;
            }
            if segment.end == Duration::MAX {
                return true;
            }
            expected = segment.end.succ();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    fn seconds(s: i64) -> Duration {
        Duration::of_seconds(s)
    }

    fn window(a: i64, b: i64) -> Window {
        Window::between(seconds(a), seconds(b)).unwrap()
    }

    #[test]
    fn fresh_cache_is_one_unknown_segment() {
        let cache = ValidityCache::new();
        assert_eq!(cache.segment_count(), 1);
        assert!(cache.is_complete_tiling());
        assert_eq!(cache.validity_at(seconds(42)), Validity::Unknown);
    }

    #[test]
    fn query_splits_unknown_into_true_and_false() {
        let mut cache = ValidityCache::new();
        let mut fetch = |_: &Window| -> Result<TimeWindows> { Ok(TimeWindows::of(window(10, 20))) };

        let found = cache.find_windows(&window(0, 30), &mut fetch).unwrap();
        assert_eq!(found, TimeWindows::of(window(10, 20)));
        assert!(cache.is_complete_tiling());
        assert_eq!(cache.validity_at(seconds(5)), Validity::False);
        assert_eq!(cache.validity_at(seconds(15)), Validity::True);
        assert_eq!(cache.validity_at(seconds(25)), Validity::False);
        assert_eq!(cache.validity_at(seconds(31)), Validity::Unknown);
    }

    #[test]
    fn resolved_segments_are_not_refetched() {
        let mut cache = ValidityCache::new();
        let mut fetches = 0;
        {
            let mut fetch = |span: &Window| -> Result<TimeWindows> {
                fetches += 1;
                let mut out = TimeWindows::of(window(10, 20));
                out.intersection(&TimeWindows::of(*span), false);
                Ok(out)
            };
            let first = cache.find_windows(&window(0, 30), &mut fetch).unwrap();
            let second = cache.find_windows(&window(0, 30), &mut fetch).unwrap();
            assert_eq!(first, second);
        }
        assert_eq!(fetches, 1);
    }

    #[test]
    fn partial_queries_leave_unknown_remainder() {
        let mut cache = ValidityCache::new();
        let mut fetch = |span: &Window| -> Result<TimeWindows> { Ok(TimeWindows::of(*span)) };

        let found = cache.find_windows(&window(10, 20), &mut fetch).unwrap();
        assert_eq!(found, TimeWindows::of(window(10, 20)));
        assert!(cache.is_complete_tiling());
        assert_eq!(cache.validity_at(seconds(5)), Validity::Unknown);
        assert_eq!(cache.validity_at(seconds(15)), Validity::True);
        assert_eq!(cache.validity_at(seconds(25)), Validity::Unknown);
    }

    #[test]
    fn fetch_errors_leave_the_cache_unchanged() {
        let mut cache = ValidityCache::new();
        let mut fetch = |_: &Window| -> Result<TimeWindows> {
            Err(crate::error::ModelError::UninitializedResource("battery".into()))
        };
        assert!(cache.find_windows(&window(0, 10), &mut fetch).is_err());
        assert_eq!(cache.segment_count(), 1);
        assert!(cache.is_complete_tiling());
    }
}
