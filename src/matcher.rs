use crate::index::{LocationIndex, LocationSample};

use chrono::{DateTime, TimeDelta, Utc};

/// Unsigned distance between two instants.
pub fn time_distance(a: DateTime<Utc>, b: DateTime<Utc>) -> TimeDelta {
    (a - b).abs()
}

/// Scans `candidates` (ascending) for the sample closest to `target`.
///
/// Stops at the first exact match. Ties keep the earlier sample.
fn closest<'a, I>(candidates: I, target: DateTime<Utc>) -> Option<(&'a LocationSample, TimeDelta)>
where
    I: Iterator<Item = &'a LocationSample>,
{
    let mut best = None;
    let mut best_distance = TimeDelta::MAX;

    for sample in candidates {
        if sample.timestamp == target {
            return Some((sample, TimeDelta::zero()));
        }

        let distance = time_distance(sample.timestamp, target);
        if distance < best_distance {
            best = Some(sample);
            best_distance = distance;
        }
    }

    best.map(|sample| (sample, best_distance))
}

/// Finds the sample recorded closest to `target`, at most `tolerance` away.
///
/// Only the window `[target - tolerance, target + tolerance]` is scanned, both
/// ends inclusive. A sample at exactly `target` wins outright; among equally
/// distant samples the earlier one is returned. A negative tolerance behaves
/// like zero.
///
/// # Arguments
/// * `index` - Location history to search.
/// * `target` - Capture time of the photo.
/// * `tolerance` - Largest accepted distance between `target` and the sample.
///
/// # Returns
/// * `Option<&LocationSample>` - The match, or `None` when nothing is close enough.
pub fn find_nearest(
    index: &LocationIndex,
    target: DateTime<Utc>,
    tolerance: TimeDelta,
) -> Option<&LocationSample> {
    let tolerance = tolerance.max(TimeDelta::zero());
    let low = target
        .checked_sub_signed(tolerance)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let high = target
        .checked_add_signed(tolerance)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    match closest(index.range(low, high), target) {
        Some((sample, distance)) if distance <= tolerance => Some(sample),
        _ => {
            tracing::trace!(%target, ?tolerance, "No location found within the defined tolerance");
            None
        }
    }
}

/// Finds the sample recorded closest to `target` anywhere in the history.
///
/// Same selection rules as `find_nearest`, without a window.
pub fn find_nearest_unbounded(index: &LocationIndex, target: DateTime<Utc>) -> Option<&LocationSample> {
    closest(index.iter(), target).map(|(sample, _)| sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap() + TimeDelta::milliseconds(ms)
    }

    fn fixture() -> LocationIndex {
        LocationIndex::new(vec![
            LocationSample::new(258135945, 81338558, at(2019, 4, 19, 20, 0, 0, 0)),
            LocationSample::new(395107349, -91427899, at(2019, 4, 19, 20, 8, 28, 785)),
            LocationSample::new(258135945, 81338558, at(2020, 4, 19, 20, 1, 28, 785)),
        ])
    }

    #[test]
    fn test_time_distance_is_unsigned() {
        let a = at(2019, 4, 19, 20, 0, 0, 0);
        let b = at(2019, 4, 19, 21, 0, 0, 0);
        assert_eq!(time_distance(a, b), TimeDelta::hours(1));
        assert_eq!(time_distance(b, a), TimeDelta::hours(1));
        assert_eq!(time_distance(a, a), TimeDelta::zero());
        assert_eq!(
            time_distance(at(2019, 4, 19, 20, 5, 30, 0), at(2019, 4, 19, 20, 7, 30, 0)),
            TimeDelta::minutes(2)
        );
    }

    #[test]
    fn test_exact_match() {
        let index = fixture();
        let found = find_nearest(&index, at(2019, 4, 19, 20, 8, 28, 785), TimeDelta::hours(1)).unwrap();
        assert_eq!(found.latitude_e7, 395107349);
        assert_eq!(found.longitude_e7, -91427899);
    }

    #[test]
    fn test_closer_sample_wins() {
        let index = fixture();
        let found = find_nearest(&index, at(2019, 4, 19, 20, 7, 30, 0), TimeDelta::hours(1)).unwrap();
        assert_eq!(found.latitude_e7, 395107349);
        assert_eq!(found.longitude_e7, -91427899);
        assert!((found.latitude() - 39.5107349).abs() < 1e-9);
        assert!((found.longitude() + 9.1427899).abs() < 1e-9);

        let found = find_nearest(&index, at(2019, 4, 19, 20, 5, 0, 0), TimeDelta::hours(1)).unwrap();
        assert_eq!(found.latitude_e7, 395107349);
    }

    #[test]
    fn test_outside_tolerance() {
        let index = fixture();
        assert!(find_nearest(&index, at(2019, 4, 19, 22, 0, 0, 0), TimeDelta::hours(1)).is_none());
    }

    #[test]
    fn test_empty_index() {
        let index = LocationIndex::default();
        let target = at(2019, 4, 19, 20, 0, 0, 0);
        assert!(find_nearest(&index, target, TimeDelta::hours(1)).is_none());
        assert!(find_nearest(&index, target, TimeDelta::zero()).is_none());
        assert!(find_nearest(&index, target, TimeDelta::days(365_000)).is_none());
        assert!(find_nearest_unbounded(&index, target).is_none());
    }

    #[test]
    fn test_single_sample_in_window() {
        let index = fixture();
        let found = find_nearest(&index, at(2020, 4, 19, 20, 30, 0, 0), TimeDelta::hours(1)).unwrap();
        assert_eq!(found.timestamp, at(2020, 4, 19, 20, 1, 28, 785));
    }

    #[test]
    fn test_equidistant_samples_earlier_wins() {
        let index = LocationIndex::new(vec![
            LocationSample::new(2, 2, at(2019, 4, 19, 20, 10, 0, 0)),
            LocationSample::new(1, 1, at(2019, 4, 19, 19, 50, 0, 0)),
        ]);
        let found = find_nearest(&index, at(2019, 4, 19, 20, 0, 0, 0), TimeDelta::hours(1)).unwrap();
        assert_eq!(found.latitude_e7, 1);

        let found = find_nearest_unbounded(&index, at(2019, 4, 19, 20, 0, 0, 0)).unwrap();
        assert_eq!(found.latitude_e7, 1);
    }

    #[test]
    fn test_exact_match_precedence() {
        let t0 = at(2019, 4, 19, 20, 0, 0, 0);
        let index = LocationIndex::new(vec![
            LocationSample::new(1, 1, t0 - TimeDelta::nanoseconds(1)),
            LocationSample::new(2, 2, t0),
            LocationSample::new(3, 3, t0 + TimeDelta::nanoseconds(1)),
        ]);
        assert_eq!(find_nearest(&index, t0, TimeDelta::hours(1)).unwrap().latitude_e7, 2);
        assert_eq!(find_nearest_unbounded(&index, t0).unwrap().latitude_e7, 2);
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let target = at(2019, 4, 19, 20, 0, 0, 0);
        let tolerance = TimeDelta::minutes(30);

        let before = LocationIndex::new(vec![LocationSample::new(1, 1, target - tolerance)]);
        assert!(find_nearest(&before, target, tolerance).is_some());

        let after = LocationIndex::new(vec![LocationSample::new(1, 1, target + tolerance)]);
        assert!(find_nearest(&after, target, tolerance).is_some());

        let beyond = LocationIndex::new(vec![
            LocationSample::new(1, 1, target - tolerance - TimeDelta::nanoseconds(1)),
            LocationSample::new(2, 2, target + tolerance + TimeDelta::nanoseconds(1)),
        ]);
        assert!(find_nearest(&beyond, target, tolerance).is_none());
    }

    #[test]
    fn test_zero_tolerance_requires_exact_match() {
        let target = at(2019, 4, 19, 20, 8, 28, 785);
        let index = fixture();
        assert!(find_nearest(&index, target, TimeDelta::zero()).is_some());
        assert!(find_nearest(&index, target + TimeDelta::milliseconds(1), TimeDelta::zero()).is_none());
    }

    #[test]
    fn test_negative_tolerance_behaves_like_zero() {
        let index = fixture();
        let target = at(2019, 4, 19, 20, 0, 0, 0);
        assert!(find_nearest(&index, target, TimeDelta::hours(-1)).is_some());
        assert!(find_nearest(&index, target + TimeDelta::seconds(1), TimeDelta::hours(-1)).is_none());
    }

    #[test]
    fn test_huge_tolerance_saturates() {
        let index = fixture();
        let found = find_nearest(&index, at(2019, 4, 19, 22, 0, 0, 0), TimeDelta::MAX).unwrap();
        assert_eq!(found.timestamp, at(2019, 4, 19, 20, 8, 28, 785));
    }

    #[test]
    fn test_unbounded_finds_distant_sample() {
        let index = fixture();
        let found = find_nearest_unbounded(&index, at(2019, 4, 19, 22, 0, 0, 0)).unwrap();
        assert_eq!(found.timestamp, at(2019, 4, 19, 20, 8, 28, 785));
    }
}
