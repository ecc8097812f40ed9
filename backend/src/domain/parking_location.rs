//! Parking location entity and its value objects.

use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::BookingWindow;
use super::geo::{Coordinates, GeoValidationError};
use super::ids::define_uuid_id;

define_uuid_id! {
    /// Stable parking location identifier.
    ParkingLocationId
}

pub const LOCATION_NAME_MIN: usize = 2;
pub const LOCATION_NAME_MAX: usize = 100;
pub const ADDRESS_MIN: usize = 5;
pub const ADDRESS_MAX: usize = 200;
pub const TOTAL_SPACES_MAX: u32 = 10_000;
pub const HOURLY_RATE_MAX_CENTS: i64 = 100_000;

/// Validation failures raised while building or patching a location.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationValidationError {
    #[error("name must be between 2 and 100 characters")]
    NameLength,
    #[error("address must be between 5 and 200 characters")]
    AddressLength,
    #[error(transparent)]
    Coordinates(#[from] GeoValidationError),
    #[error("total spaces must be between 1 and 10000")]
    TotalSpaces,
    #[error("hourly rate must be between 0 and 100000 cents")]
    HourlyRate,
    #[error("opening time must be before closing time")]
    OperatingHours,
    #[error("unknown amenity: {0}")]
    UnknownAmenity(String),
    #[error("unknown location status: {0}")]
    UnknownStatus(String),
}

impl LocationValidationError {
    /// Request field the failure relates to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameLength => "name",
            Self::AddressLength => "address",
            Self::Coordinates(inner) => inner.field(),
            Self::TotalSpaces => "totalSpaces",
            Self::HourlyRate => "hourlyRateCents",
            Self::OperatingHours => "operatingHours",
            Self::UnknownAmenity(_) => "amenities",
            Self::UnknownStatus(_) => "status",
        }
    }

    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NameLength => "invalid_name",
            Self::AddressLength => "invalid_address",
            Self::Coordinates(_) => "invalid_coordinates",
            Self::TotalSpaces => "invalid_total_spaces",
            Self::HourlyRate => "invalid_hourly_rate",
            Self::OperatingHours => "invalid_operating_hours",
            Self::UnknownAmenity(_) => "unknown_amenity",
            Self::UnknownStatus(_) => "unknown_status",
        }
    }
}

fn bounded_text(
    raw: impl Into<String>,
    min: usize,
    max: usize,
    err: LocationValidationError,
) -> Result<String, LocationValidationError> {
    let text = raw.into().trim().to_owned();
    let length = text.chars().count();
    if length < min || length > max {
        return Err(err);
    }
    Ok(text)
}

/// Display name of a parking location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct LocationName(String);

impl LocationName {
    pub fn new(raw: impl Into<String>) -> Result<Self, LocationValidationError> {
        bounded_text(
            raw,
            LOCATION_NAME_MIN,
            LOCATION_NAME_MAX,
            LocationValidationError::NameLength,
        )
        .map(Self)
    }
}

/// Street address of a parking location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Result<Self, LocationValidationError> {
        bounded_text(raw, ADDRESS_MIN, ADDRESS_MAX, LocationValidationError::AddressLength)
            .map(Self)
    }
}

macro_rules! text_value_impls {
    ($($name:ident),*) => {
        $(
            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    self.0.as_str()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_ref())
                }
            }

            impl From<$name> for String {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )*
    };
}

text_value_impls!(LocationName, Address);

/// Price per hour in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "i64")]
pub struct HourlyRate(i64);

impl HourlyRate {
    pub fn from_cents(cents: i64) -> Result<Self, LocationValidationError> {
        if !(0..=HOURLY_RATE_MAX_CENTS).contains(&cents) {
            return Err(LocationValidationError::HourlyRate);
        }
        Ok(Self(cents))
    }

    pub fn cents(self) -> i64 {
        self.0
    }
}

impl From<HourlyRate> for i64 {
    fn from(value: HourlyRate) -> Self {
        value.0
    }
}

/// Number of bookable spaces at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "u32")]
pub struct Capacity(u32);

impl Capacity {
    pub fn new(spaces: u32) -> Result<Self, LocationValidationError> {
        if spaces == 0 || spaces > TOTAL_SPACES_MAX {
            return Err(LocationValidationError::TotalSpaces);
        }
        Ok(Self(spaces))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<Capacity> for u32 {
    fn from(value: Capacity) -> Self {
        value.0
    }
}

/// When a location accepts vehicles, as UTC wall-clock times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(try_from = "OperatingHoursDto")]
pub enum OperatingHours {
    AlwaysOpen,
    Daily {
        #[serde(rename = "opensAt")]
        opens_at: NaiveTime,
        #[serde(rename = "closesAt")]
        closes_at: NaiveTime,
    },
}

impl OperatingHours {
    /// Daily opening window; `opens_at` must be strictly before `closes_at`.
    pub fn daily(opens_at: NaiveTime, closes_at: NaiveTime) -> Result<Self, LocationValidationError> {
        if opens_at >= closes_at {
            return Err(LocationValidationError::OperatingHours);
        }
        Ok(Self::Daily {
            opens_at,
            closes_at,
        })
    }

    /// True when the whole window falls inside the opening hours.
    ///
    /// Daily hours never span midnight, so the window must start and end on
    /// the same UTC date.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveTime;
    /// use parkspot::domain::{BookingWindow, OperatingHours};
    ///
    /// let hours = OperatingHours::daily(
    ///     NaiveTime::from_hms_opt(8, 0, 0).expect("time"),
    ///     NaiveTime::from_hms_opt(18, 0, 0).expect("time"),
    /// )
    /// .expect("valid hours");
    /// let window = BookingWindow::new(
    ///     "2025-03-01T09:00:00Z".parse().expect("start"),
    ///     "2025-03-01T11:00:00Z".parse().expect("end"),
    /// )
    /// .expect("valid window");
    /// assert!(hours.admits(&window));
    /// ```
    pub fn admits(&self, window: &BookingWindow) -> bool {
        match self {
            Self::AlwaysOpen => true,
            Self::Daily {
                opens_at,
                closes_at,
            } => {
                let start = window.start();
                let end = window.end();
                start.date_naive() == end.date_naive()
                    && *opens_at <= start.time()
                    && end.time() <= *closes_at
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OperatingHoursDto {
    AlwaysOpen,
    Daily {
        #[serde(rename = "opensAt")]
        opens_at: NaiveTime,
        #[serde(rename = "closesAt")]
        closes_at: NaiveTime,
    },
}

impl TryFrom<OperatingHoursDto> for OperatingHours {
    type Error = LocationValidationError;

    fn try_from(value: OperatingHoursDto) -> Result<Self, Self::Error> {
        match value {
            OperatingHoursDto::AlwaysOpen => Ok(Self::AlwaysOpen),
            OperatingHoursDto::Daily {
                opens_at,
                closes_at,
            } => Self::daily(opens_at, closes_at),
        }
    }
}

/// Facility offered at a location.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Amenity {
    Covered,
    EvCharging,
    Security,
    Cctv,
    DisabledAccess,
    Valet,
    BikeParking,
}

impl Amenity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Covered => "covered",
            Self::EvCharging => "ev_charging",
            Self::Security => "security",
            Self::Cctv => "cctv",
            Self::DisabledAccess => "disabled_access",
            Self::Valet => "valet",
            Self::BikeParking => "bike_parking",
        }
    }
}

impl std::str::FromStr for Amenity {
    type Err = LocationValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "covered" => Ok(Self::Covered),
            "ev_charging" => Ok(Self::EvCharging),
            "security" => Ok(Self::Security),
            "cctv" => Ok(Self::Cctv),
            "disabled_access" => Ok(Self::DisabledAccess),
            "valet" => Ok(Self::Valet),
            "bike_parking" => Ok(Self::BikeParking),
            other => Err(LocationValidationError::UnknownAmenity(other.to_owned())),
        }
    }
}

/// Sorted, duplicate-free amenity list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<Amenity>")]
pub struct AmenitySet(Vec<Amenity>);

impl AmenitySet {
    pub fn new(amenities: impl IntoIterator<Item = Amenity>) -> Self {
        let mut items: Vec<Amenity> = amenities.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        Self(items)
    }

    pub fn contains(&self, amenity: Amenity) -> bool {
        self.0.binary_search(&amenity).is_ok()
    }

    /// True when every amenity in `required` is offered.
    pub fn contains_all(&self, required: &AmenitySet) -> bool {
        required.0.iter().all(|amenity| self.contains(*amenity))
    }

    pub fn as_slice(&self) -> &[Amenity] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<AmenitySet> for Vec<Amenity> {
    fn from(value: AmenitySet) -> Self {
        value.0
    }
}

/// Operational state of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationStatus {
    Active,
    Inactive,
    Maintenance,
}

impl LocationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Maintenance => "maintenance",
        }
    }
}

impl std::str::FromStr for LocationStatus {
    type Err = LocationValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(LocationValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Unvalidated input for [`ParkingLocation::create`].
#[derive(Debug, Clone)]
pub struct ParkingLocationDraft {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_spaces: u32,
    pub hourly_rate_cents: i64,
    pub operating_hours: OperatingHours,
    pub amenities: Vec<Amenity>,
    pub status: LocationStatus,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ParkingLocationPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub total_spaces: Option<u32>,
    pub hourly_rate_cents: Option<i64>,
    pub operating_hours: Option<OperatingHours>,
    pub amenities: Option<Vec<Amenity>>,
    pub status: Option<LocationStatus>,
}

/// A car park that accepts bookings.
///
/// ## Invariants
/// - `total_spaces` is between 1 and 10 000.
/// - `amenities` is sorted and free of duplicates.
/// - `updated_at >= created_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingLocation {
    id: ParkingLocationId,
    name: LocationName,
    address: Address,
    coordinates: Coordinates,
    total_spaces: Capacity,
    hourly_rate_cents: HourlyRate,
    operating_hours: OperatingHours,
    amenities: AmenitySet,
    status: LocationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ParkingLocation {
    /// Validate a draft into a new location stamped with `now`.
    pub fn create(
        id: ParkingLocationId,
        draft: ParkingLocationDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, LocationValidationError> {
        Ok(Self {
            id,
            name: LocationName::new(draft.name)?,
            address: Address::new(draft.address)?,
            coordinates: Coordinates::new(draft.latitude, draft.longitude)?,
            total_spaces: Capacity::new(draft.total_spaces)?,
            hourly_rate_cents: HourlyRate::from_cents(draft.hourly_rate_cents)?,
            operating_hours: draft.operating_hours,
            amenities: AmenitySet::new(draft.amenities),
            status: draft.status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a location loaded from storage, revalidating every field.
    pub fn restore(
        id: ParkingLocationId,
        draft: ParkingLocationDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, LocationValidationError> {
        let mut location = Self::create(id, draft, created_at)?;
        location.updated_at = updated_at.max(created_at);
        Ok(location)
    }

    /// Apply a partial update, validating every supplied field.
    ///
    /// The location is left untouched when any field fails validation.
    pub fn apply(
        &self,
        patch: ParkingLocationPatch,
        now: DateTime<Utc>,
    ) -> Result<Self, LocationValidationError> {
        let mut next = self.clone();
        if let Some(name) = patch.name {
            next.name = LocationName::new(name)?;
        }
        if let Some(address) = patch.address {
            next.address = Address::new(address)?;
        }
        if patch.latitude.is_some() || patch.longitude.is_some() {
            next.coordinates = Coordinates::new(
                patch.latitude.unwrap_or(self.coordinates.latitude()),
                patch.longitude.unwrap_or(self.coordinates.longitude()),
            )?;
        }
        if let Some(spaces) = patch.total_spaces {
            next.total_spaces = Capacity::new(spaces)?;
        }
        if let Some(cents) = patch.hourly_rate_cents {
            next.hourly_rate_cents = HourlyRate::from_cents(cents)?;
        }
        if let Some(hours) = patch.operating_hours {
            next.operating_hours = hours;
        }
        if let Some(amenities) = patch.amenities {
            next.amenities = AmenitySet::new(amenities);
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        next.updated_at = now.max(self.created_at);
        Ok(next)
    }

    pub fn id(&self) -> ParkingLocationId {
        self.id
    }

    pub fn name(&self) -> &LocationName {
        &self.name
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn total_spaces(&self) -> Capacity {
        self.total_spaces
    }

    pub fn hourly_rate(&self) -> HourlyRate {
        self.hourly_rate_cents
    }

    pub fn operating_hours(&self) -> OperatingHours {
        self.operating_hours
    }

    pub fn amenities(&self) -> &AmenitySet {
        &self.amenities
    }

    pub fn status(&self) -> LocationStatus {
        self.status
    }

    /// Only active locations accept bookings or appear in nearby search.
    pub fn is_active(&self) -> bool {
        self.status == LocationStatus::Active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
