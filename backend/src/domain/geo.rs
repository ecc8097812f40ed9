//! Geographic primitives: coordinates, great-circle distance and search areas.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;
/// Upper bound for a nearby search radius.
pub const MAX_SEARCH_RADIUS_KM: f64 = 50.0;
/// Radius used when the caller does not supply one.
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 5.0;

/// Validation failures for geographic input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoValidationError {
    #[error("latitude must be a finite number between -90 and 90, got {0}")]
    Latitude(f64),
    #[error("longitude must be a finite number between -180 and 180, got {0}")]
    Longitude(f64),
    #[error("radius must be greater than 0 and at most 50 km, got {0}")]
    Radius(f64),
}

impl GeoValidationError {
    /// Request field the failure relates to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Latitude(_) => "latitude",
            Self::Longitude(_) => "longitude",
            Self::Radius(_) => "radiusKm",
        }
    }
}

/// WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate and construct a coordinate pair.
    ///
    /// # Examples
    /// ```
    /// use parkspot::domain::Coordinates;
    ///
    /// assert!(Coordinates::new(51.5, -0.12).is_ok());
    /// assert!(Coordinates::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoValidationError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoValidationError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Great-circle distance between two points in kilometres.
///
/// # Examples
/// ```
/// use parkspot::domain::{Coordinates, haversine_km};
///
/// let london = Coordinates::new(51.5074, -0.1278).expect("valid");
/// let paris = Coordinates::new(48.8566, 2.3522).expect("valid");
/// let km = haversine_km(london, paris);
/// assert!((km - 343.5).abs() < 1.0);
/// ```
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Radius of a nearby search, in kilometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct SearchRadius(f64);

impl SearchRadius {
    /// Accept radii in `(0, 50]` km.
    pub fn new(km: f64) -> Result<Self, GeoValidationError> {
        if !km.is_finite() || km <= 0.0 || km > MAX_SEARCH_RADIUS_KM {
            return Err(GeoValidationError::Radius(km));
        }
        Ok(Self(km))
    }

    pub fn km(&self) -> f64 {
        self.0
    }
}

impl Default for SearchRadius {
    fn default() -> Self {
        Self(DEFAULT_SEARCH_RADIUS_KM)
    }
}

impl TryFrom<f64> for SearchRadius {
    type Error = GeoValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SearchRadius> for f64 {
    fn from(value: SearchRadius) -> Self {
        value.0
    }
}

/// Latitude/longitude box enclosing a search circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    /// Box around `center` that contains every point within `radius`.
    ///
    /// Returns `None` when the box would wrap a pole or the antimeridian; the
    /// caller should then scan without a prefilter.
    pub fn around(center: Coordinates, radius: SearchRadius) -> Option<Self> {
        let angular = radius.km() / EARTH_RADIUS_KM;
        let d_lat = angular.to_degrees();
        let min_lat = center.latitude - d_lat;
        let max_lat = center.latitude + d_lat;
        if min_lat <= -90.0 || max_lat >= 90.0 {
            return None;
        }

        let lat_rad = center.latitude.to_radians();
        let sin_ratio = angular.sin() / lat_rad.cos();
        if !sin_ratio.is_finite() || sin_ratio >= 1.0 {
            return None;
        }
        let d_lng = sin_ratio.asin().to_degrees();
        let min_lng = center.longitude - d_lng;
        let max_lng = center.longitude + d_lng;
        if min_lng < -180.0 || max_lng > 180.0 {
            return None;
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// True when the point lies inside the box (inclusive).
    pub fn contains(&self, point: Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lng..=self.max_lng).contains(&point.longitude)
    }
}
