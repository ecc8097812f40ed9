//! Nearby search: Haversine ranking of parking locations around a point.

use std::cmp::Ordering;

use super::geo::{Coordinates, SearchRadius, haversine_km};
use super::parking_location::{AmenitySet, HourlyRate, ParkingLocation};

pub const NEARBY_LIMIT_MAX: usize = 100;
pub const NEARBY_LIMIT_DEFAULT: usize = 20;

/// Validated nearby search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub center: Coordinates,
    pub radius: SearchRadius,
    limit: usize,
    pub min_available_spaces: Option<u32>,
    pub max_hourly_rate: Option<HourlyRate>,
    pub required_amenities: AmenitySet,
}

/// Limit outside `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("limit must be between 1 and 100, got {0}")]
pub struct InvalidNearbyLimit(pub usize);

impl NearbyQuery {
    /// Query with default radius, limit and no filters.
    pub fn around(center: Coordinates) -> Self {
        Self {
            center,
            radius: SearchRadius::default(),
            limit: NEARBY_LIMIT_DEFAULT,
            min_available_spaces: None,
            max_hourly_rate: None,
            required_amenities: AmenitySet::default(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Result<Self, InvalidNearbyLimit> {
        if limit == 0 || limit > NEARBY_LIMIT_MAX {
            return Err(InvalidNearbyLimit(limit));
        }
        self.limit = limit;
        Ok(self)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyCandidate {
    pub location: ParkingLocation,
    pub distance_km: f64,
}

/// Rank `candidates` by distance from the query centre.
///
/// Inactive locations, those beyond the radius, and those failing the rate
/// or amenity filters are dropped. Ties on distance fall back to name then
/// id so the order is deterministic. Availability filtering is left to the
/// caller because it needs booking data.
pub fn rank_nearby(
    query: &NearbyQuery,
    candidates: impl IntoIterator<Item = ParkingLocation>,
) -> Vec<NearbyCandidate> {
    let mut hits = rank_unbounded(query, candidates);
    hits.truncate(query.limit);
    hits
}

/// [`rank_nearby`] without the final truncation, for callers that filter
/// further before applying the limit.
pub(crate) fn rank_unbounded(
    query: &NearbyQuery,
    candidates: impl IntoIterator<Item = ParkingLocation>,
) -> Vec<NearbyCandidate> {
    let mut hits: Vec<NearbyCandidate> = candidates
        .into_iter()
        .filter(ParkingLocation::is_active)
        .filter_map(|location| {
            let distance_km = haversine_km(query.center, location.coordinates());
            (distance_km <= query.radius.km()).then_some(NearbyCandidate {
                location,
                distance_km,
            })
        })
        .filter(|hit| {
            query
                .max_hourly_rate
                .is_none_or(|max| hit.location.hourly_rate() <= max)
        })
        .filter(|hit| {
            hit.location
                .amenities()
                .contains_all(&query.required_amenities)
        })
        .collect();

    hits.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.location.name().as_ref().cmp(b.location.name().as_ref()))
            .then_with(|| a.location.id().cmp(&b.location.id()))
    });
    hits
}
