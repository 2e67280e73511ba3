use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::availability::DayOfWeek;
use super::catalog::{self, SubjectId};
use super::domain::{DeliveryMode, Tutor};
use super::money::Money;

/// Radius applied when `nearby_only` is set without an explicit distance.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

/// Transient query object built fresh per search. Unset fields always pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TutorSearchFilter {
    pub subjects: BTreeSet<SubjectId>,
    pub min_rating: Option<f64>,
    pub max_hourly_rate: Option<Money>,
    pub delivery_mode: Option<DeliveryMode>,
    pub available_this_week: bool,
    pub available_today: bool,
    pub nearby_only: bool,
    /// Kilometers; only meaningful with `nearby_only`.
    pub max_distance: Option<f64>,
}

/// Geographic coordinate used for the nearby clause.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Great-circle distance in kilometers (haversine).
    pub fn distance_km(self, other: GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Caller-supplied evaluation context so the engine stays pure: the reference
/// day anchors the `available_today` clause and the origin anchors `nearby_only`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchContext {
    pub reference_day: DayOfWeek,
    pub origin: Option<GeoPoint>,
}

impl SearchContext {
    pub fn on(reference_day: DayOfWeek) -> Self {
        SearchContext {
            reference_day,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: GeoPoint) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// Evaluate the composite filter over a tutor collection, preserving input
/// order. Pure; an empty result is a valid outcome.
pub fn search_tutors<'a>(
    tutors: &'a [Tutor],
    filter: &TutorSearchFilter,
    query: Option<&str>,
    context: &SearchContext,
) -> Vec<&'a Tutor> {
    tutors
        .iter()
        .filter(|tutor| matches(tutor, filter, query, context))
        .collect()
}

fn matches(
    tutor: &Tutor,
    filter: &TutorSearchFilter,
    query: Option<&str>,
    context: &SearchContext,
) -> bool {
    if let Some(query) = query.map(str::trim).filter(|query| !query.is_empty()) {
        if !matches_free_text(tutor, query) {
            return false;
        }
    }

    if !filter.subjects.is_empty()
        && filter.subjects.is_disjoint(&tutor.subjects)
    {
        return false;
    }

    // Rate ceiling and rating floor are inclusive at the boundary.
    if let Some(max_rate) = filter.max_hourly_rate {
        if tutor.hourly_rate > max_rate {
            return false;
        }
    }

    if let Some(min_rating) = filter.min_rating {
        if tutor.rating < min_rating {
            return false;
        }
    }

    if let Some(wanted) = filter.delivery_mode {
        if !tutor.delivery_mode.covers(wanted) {
            return false;
        }
    }

    if filter.available_today && !tutor.availability.has_slots_on(context.reference_day) {
        return false;
    }

    if filter.available_this_week && !tutor.availability.has_any_slot() {
        return false;
    }

    if filter.nearby_only {
        // Without an origin the clause cannot be evaluated; skip it.
        if let Some(origin) = context.origin {
            let Some(location) = tutor_location(tutor) else {
                return false;
            };
            let radius = filter.max_distance.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
            if origin.distance_km(location) > radius {
                return false;
            }
        }
    }

    true
}

/// Case-insensitive substring match against the tutor's subject display names
/// and suburb.
fn matches_free_text(tutor: &Tutor, query: &str) -> bool {
    let query = query.to_lowercase();

    if tutor.suburb.to_lowercase().contains(&query) {
        return true;
    }

    tutor
        .subjects
        .iter()
        .any(|id| catalog::subject_name(id).to_lowercase().contains(&query))
}

fn tutor_location(tutor: &Tutor) -> Option<GeoPoint> {
    match (tutor.latitude, tutor.longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint {
            latitude,
            longitude,
        }),
        _ => None,
    }
}
