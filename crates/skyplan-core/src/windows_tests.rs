//! Interval algebra tests.

use crate::time::Duration;
use crate::windows::{TimeWindows, Window};

fn seconds(s: i64) -> Duration {
    Duration::of_seconds(s)
}

fn window(a: i64, b: i64) -> Window {
    Window::between(seconds(a), seconds(b)).unwrap()
}

#[test]
fn window_construction_rejects_inverted_bounds() {
    assert!(Window::between(seconds(2), seconds(1)).is_err());
    assert!(Window::between(seconds(1), seconds(1)).unwrap().is_singleton());
}

#[test]
fn union_keeps_disjoint_windows_apart() {
    let mut w = TimeWindows::of_all([window(3, 4), window(5, 7), window(10, 11), window(12, 15)]);
    w.union(window(1, 2));
    w.union(window(17, 18));
    w.union(window(8, 9));
    let collected: Vec<Window> = w.iter().collect();
    assert_eq!(
        collected,
        vec![
            window(1, 2),
            window(3, 4),
            window(5, 7),
            window(8, 9),
            window(10, 11),
            window(12, 15),
            window(17, 18),
        ]
    );
}

#[test]
fn union_merges_overlaps_from_both_sides() {
    let mut w = TimeWindows::of_all([window(3, 4), window(5, 7), window(10, 11), window(12, 15)]);
    w.union(window(8, 11));
    assert!(w.iter().any(|x| x == window(8, 11)));
    w.union(window(13, 16));
    assert!(w.iter().any(|x| x == window(12, 16)));
    assert_eq!(w.len(), 4);
}

#[test]
fn union_result_spans_min_and_max_of_merged_windows() {
    let mut w = TimeWindows::of_all([window(2, 4), window(6, 8), window(10, 12)]);
    w.union(window(3, 11));
    assert_eq!(w.iter().collect::<Vec<_>>(), vec![window(2, 12)]);
}

#[test]
fn merge_mode_coalesces_shared_endpoints_non_merge_keeps_them() {
    let mut merging = TimeWindows::new();
    merging.union(window(0, 5));
    merging.union(window(5, 9));
    assert_eq!(merging.len(), 1);

    let mut separate = TimeWindows::non_merging();
    separate.union(window(0, 5));
    separate.union(window(5, 9));
    assert_eq!(separate.len(), 2);
}

#[test]
fn non_merge_mode_still_coalesces_overlaps() {
    let mut w = TimeWindows::non_merging();
    w.union(window(0, 5));
    w.union(window(3, 9));
    assert_eq!(w.iter().collect::<Vec<_>>(), vec![window(0, 9)]);
}

#[test]
fn intersection_is_a_subset_of_both_operands() {
    let a = TimeWindows::of_all([window(0, 10), window(20, 30)]);
    let b = TimeWindows::of_all([window(5, 25)]);
    let mut both = a.clone();
    both.intersection(&b, false);

    assert_eq!(both, TimeWindows::of_all([window(5, 10), window(20, 25)]));
    for piece in both.iter() {
        assert!(a.iter().any(|w| w.intersect(&piece) == Some(piece)));
        assert!(b.iter().any(|w| w.intersect(&piece) == Some(piece)));
    }
}

#[test]
fn intersection_no_instant_drops_singleton_touches() {
    let a = TimeWindows::of(window(0, 10));
    let b = TimeWindows::of(window(10, 20));

    let mut with_instant = a.clone();
    with_instant.intersection(&b, false);
    assert_eq!(with_instant, TimeWindows::of(Window::at(seconds(10))));

    let mut without = a.clone();
    without.intersection(&b, true);
    assert!(without.is_empty());
}

#[test]
fn complement_of_empty_is_everything() {
    let mut w = TimeWindows::new();
    w.complement();
    assert_eq!(w, TimeWindows::forever());
}

#[test]
fn complement_inverts_over_the_full_timeline() {
    let mut w = TimeWindows::of_all([window(1, 2), window(4, 5), window(6, 7)]);
    w.complement();
    assert_eq!(
        w,
        TimeWindows::of_all([
            Window::between(Duration::ZERO, seconds(1)).unwrap(),
            window(2, 4),
            window(5, 6),
            Window::between(seconds(7), Duration::MAX).unwrap(),
        ])
    );
}

#[test]
fn double_complement_is_identity() {
    let a = TimeWindows::of_all([window(1, 3), window(7, 9)]);
    let b = TimeWindows::of_all([window(2, 5), window(20, 40)]);
    let mut unioned = a.clone();
    unioned.union_all(&b);

    let mut twice = unioned.clone();
    twice.complement();
    twice.complement();
    assert_eq!(twice, unioned);
}

#[test]
fn subtraction_leaves_nothing_of_the_subtrahend() {
    let a = TimeWindows::of_all([window(0, 10), window(20, 30)]);
    let b = TimeWindows::of_all([window(5, 25)]);

    let mut diff = a.clone();
    diff.subtract(&b);
    assert_eq!(diff, TimeWindows::of_all([window(0, 5), window(25, 30)]));

    diff.intersection(&b, true);
    assert!(diff.is_empty());
}

#[test]
fn filter_by_duration_bounds_window_lengths() {
    let mut w = TimeWindows::of_all([window(0, 1), window(10, 15), window(20, 40)]);
    w.filter_by_duration(Some(seconds(2)), Some(seconds(10)));
    assert_eq!(w.iter().collect::<Vec<_>>(), vec![window(10, 15)]);
}

#[test]
fn subset_fully_contained_keeps_only_inner_windows() {
    let w = TimeWindows::of_all([window(0, 4), window(5, 8), window(9, 20)]);
    let inner = w.subset_fully_contained(&window(4, 10));
    assert_eq!(inner.iter().collect::<Vec<_>>(), vec![window(5, 8)]);
}

#[test]
fn contract_by_drops_inverted_windows() {
    let mut w = TimeWindows::of_all([window(0, 10), window(20, 22)]);
    w.contract_by(seconds(2), seconds(3));
    assert_eq!(w.iter().collect::<Vec<_>>(), vec![window(2, 7)]);
}

#[test]
fn empty_set_has_no_extremes() {
    let w = TimeWindows::new();
    assert_eq!(w.minimum(), None);
    assert_eq!(w.maximum(), None);
    assert!(w.is_empty());
}

#[test]
fn extremes_span_the_whole_set() {
    let w = TimeWindows::of_all([window(4, 6), window(1, 2), window(9, 12)]);
    assert_eq!(w.minimum(), Some(seconds(1)));
    assert_eq!(w.maximum(), Some(seconds(12)));
}

#[test]
fn containment_queries_are_inclusive() {
    let w = TimeWindows::of_all([window(1, 3), window(6, 8)]);
    assert!(w.contains(seconds(1)));
    assert!(w.contains(seconds(3)));
    assert!(!w.contains(seconds(4)));
    assert!(w.intersects(&window(3, 5)));
    assert!(!w.intersects(&window(4, 5)));
}

#[test]
fn first_and_last_removal() {
    let mut w = TimeWindows::of_all([window(1, 2), window(4, 5), window(7, 8)]);
    w.remove_first();
    w.remove_last();
    assert_eq!(w.iter().collect::<Vec<_>>(), vec![window(4, 5)]);
}

#[test]
fn display_is_bracketed() {
    let w = TimeWindows::of_all([window(1, 2)]);
    assert_eq!(w.to_string(), "{[1s,2s]}");
}
