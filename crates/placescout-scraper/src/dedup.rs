//! Streaming deduplication on fuzzy name + geolocation identity.
//!
//! Two records describe the same place when their normalized names match
//! and their coordinates lie within the configured great-circle tolerance.
//! First-seen wins: later matches are rejected, never merged. State grows
//! monotonically for the run; the run's duration bounds memory, so there
//! is no eviction.

use placescout_core::PlaceRecord;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Decision for one incoming record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// New entity; the caller should keep the record.
    Admitted,
    /// Duplicate of an already-admitted entity, identified by its
    /// normalized name key.
    Rejected { existing: String },
}

/// Identity key of an admitted record: normalized name plus coordinates.
/// Derived for comparison only, never persisted verbatim.
#[derive(Debug, Clone)]
struct SeenEntry {
    name_key: String,
    coords: Option<(f64, f64)>,
}

/// Admits or rejects records one at a time as they are extracted, so the
/// caller can save output incrementally.
#[derive(Debug)]
pub struct Deduplicator {
    tolerance_meters: f64,
    seen: Vec<SeenEntry>,
}

impl Deduplicator {
    /// A deduplicator with the given distance tolerance in meters.
    #[must_use]
    pub fn new(tolerance_meters: f64) -> Self {
        Self {
            tolerance_meters,
            seen: Vec::new(),
        }
    }

    /// Decides whether `record` is a new entity.
    ///
    /// Same entity: equal normalized names AND coordinates within
    /// tolerance. When either side lacks a coordinate pair, the name
    /// match alone decides. Admitting mutates state; rejecting does not
    /// overwrite or merge anything.
    pub fn admit(&mut self, record: &PlaceRecord) -> Admission {
        let name_key = normalize_name(&record.name);
        let coords = coordinate_pair(record);

        for entry in &self.seen {
            if entry.name_key != name_key {
                continue;
            }
            match (entry.coords, coords) {
                (Some((lat1, lon1)), Some((lat2, lon2))) => {
                    let distance = haversine_meters(lat1, lon1, lat2, lon2);
                    if distance <= self.tolerance_meters {
                        tracing::debug!(
                            name = %record.name,
                            distance_m = distance,
                            "rejecting duplicate record"
                        );
                        return Admission::Rejected {
                            existing: entry.name_key.clone(),
                        };
                    }
                }
                // Without both coordinate pairs the name match decides.
                _ => {
                    tracing::debug!(name = %record.name, "rejecting duplicate record by name");
                    return Admission::Rejected {
                        existing: entry.name_key.clone(),
                    };
                }
            }
        }

        self.seen.push(SeenEntry { name_key, coords });
        Admission::Admitted
    }

    /// Number of distinct entities admitted so far.
    #[must_use]
    pub fn admitted_count(&self) -> usize {
        self.seen.len()
    }
}

fn coordinate_pair(record: &PlaceRecord) -> Option<(f64, f64)> {
    match (record.latitude, record.longitude) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    }
}

/// Lowercases and collapses runs of whitespace to single spaces.
fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Great-circle distance in meters between two degree coordinate pairs.
fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};
    use placescout_core::PlaceRecord;

    use super::*;

    fn record(name: &str, lat: Option<f64>, lon: Option<f64>) -> PlaceRecord {
        PlaceRecord {
            name: name.to_owned(),
            address: None,
            latitude: lat,
            longitude: lon,
            phone: None,
            emails: BTreeSet::new(),
            website: None,
            category: None,
            rating: None,
            hours: None,
            price_level: None,
            business_status: None,
            scraped_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    /// Offsets `lat` north by roughly `meters`.
    fn offset_north(lat: f64, meters: f64) -> f64 {
        lat + meters / 111_320.0
    }

    // -----------------------------------------------------------------------
    // Haversine
    // -----------------------------------------------------------------------

    #[test]
    fn haversine_zero_for_identical_points() {
        assert!(haversine_meters(25.7617, -80.1918, 25.7617, -80.1918) < 1e-9);
    }

    #[test]
    fn haversine_matches_known_offset() {
        let d = haversine_meters(25.7617, -80.1918, offset_north(25.7617, 20.0), -80.1918);
        assert!((d - 20.0).abs() < 0.5, "expected ~20m, got {d}");
    }

    // -----------------------------------------------------------------------
    // Admission
    // -----------------------------------------------------------------------

    #[test]
    fn admits_first_record() {
        let mut dedup = Deduplicator::new(25.0);
        let r = record("Joe's Cafe", Some(25.7617), Some(-80.1918));
        assert_eq!(dedup.admit(&r), Admission::Admitted);
        assert_eq!(dedup.admitted_count(), 1);
    }

    #[test]
    fn point_within_tolerance_is_duplicate() {
        let mut dedup = Deduplicator::new(25.0);
        let first = record("Joe's Cafe", Some(25.7617), Some(-80.1918));
        assert_eq!(dedup.admit(&first), Admission::Admitted);

        let nearby = record(
            "Joe's Cafe",
            Some(offset_north(25.7617, 20.0)),
            Some(-80.1918),
        );
        assert!(matches!(
            dedup.admit(&nearby),
            Admission::Rejected { ref existing } if existing == "joe's cafe"
        ));
        assert_eq!(dedup.admitted_count(), 1);
    }

    #[test]
    fn point_beyond_tolerance_is_new() {
        let mut dedup = Deduplicator::new(25.0);
        let first = record("Joe's Cafe", Some(25.7617), Some(-80.1918));
        assert_eq!(dedup.admit(&first), Admission::Admitted);

        let farther = record(
            "Joe's Cafe",
            Some(offset_north(25.7617, 30.0)),
            Some(-80.1918),
        );
        assert_eq!(dedup.admit(&farther), Admission::Admitted);
        assert_eq!(dedup.admitted_count(), 2);
    }

    #[test]
    fn name_normalization_collapses_case_and_whitespace() {
        let mut dedup = Deduplicator::new(25.0);
        let first = record("Joe's Cafe", Some(25.7617), Some(-80.1918));
        let variant = record("joe's   cafe", Some(25.7617), Some(-80.1918));
        assert_eq!(dedup.admit(&first), Admission::Admitted);
        assert!(matches!(dedup.admit(&variant), Admission::Rejected { .. }));
        assert_eq!(dedup.admitted_count(), 1, "first-seen wins");
    }

    #[test]
    fn different_names_at_same_point_are_distinct() {
        let mut dedup = Deduplicator::new(25.0);
        let a = record("Joe's Cafe", Some(25.7617), Some(-80.1918));
        let b = record("Moe's Tavern", Some(25.7617), Some(-80.1918));
        assert_eq!(dedup.admit(&a), Admission::Admitted);
        assert_eq!(dedup.admit(&b), Admission::Admitted);
    }

    #[test]
    fn missing_coordinates_fall_back_to_name_identity() {
        let mut dedup = Deduplicator::new(25.0);
        let located = record("Joe's Cafe", Some(25.7617), Some(-80.1918));
        let unlocated = record("Joe's Cafe", None, None);
        assert_eq!(dedup.admit(&located), Admission::Admitted);
        assert!(matches!(dedup.admit(&unlocated), Admission::Rejected { .. }));
    }

    #[test]
    fn records_missing_optional_fields_are_still_admitted() {
        let mut dedup = Deduplicator::new(25.0);
        let bare = record("No Contact Info Diner", Some(40.0), Some(-75.0));
        assert!(bare.emails.is_empty());
        assert!(bare.website.is_none());
        assert_eq!(dedup.admit(&bare), Admission::Admitted);
    }

    #[test]
    fn wider_tolerance_widens_duplicate_radius() {
        let mut dedup = Deduplicator::new(50.0);
        let first = record("Joe's Cafe", Some(25.7617), Some(-80.1918));
        let at_30m = record(
            "Joe's Cafe",
            Some(offset_north(25.7617, 30.0)),
            Some(-80.1918),
        );
        assert_eq!(dedup.admit(&first), Admission::Admitted);
        assert!(matches!(dedup.admit(&at_30m), Admission::Rejected { .. }));
    }
}
