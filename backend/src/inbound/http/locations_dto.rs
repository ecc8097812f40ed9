//! Parking location DTOs and request parsing.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{AvailabilityQuote, LocationView, NearbyLocation};
use crate::domain::{
    Amenity, AmenitySet, BookingWindow, Coordinates, Error, HourlyRate, LocationStatus, NearbyQuery,
    OperatingHours, ParkingLocation, ParkingLocationDraft, ParkingLocationPatch, SearchRadius,
};
use crate::inbound::http::validation::{
    FieldName, from_geo_error, from_location_error, invalid_field, parse_csv,
    parse_rfc3339_timestamp, require,
};

/// Opening hours on the wire, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperatingHoursBody {
    AlwaysOpen,
    Daily {
        #[serde(rename = "opensAt")]
        #[schema(value_type = String, example = "07:00:00")]
        opens_at: NaiveTime,
        #[serde(rename = "closesAt")]
        #[schema(value_type = String, example = "22:00:00")]
        closes_at: NaiveTime,
    },
}

impl OperatingHoursBody {
    fn into_domain(self) -> Result<OperatingHours, Error> {
        match self {
            Self::AlwaysOpen => Ok(OperatingHours::AlwaysOpen),
            Self::Daily {
                opens_at,
                closes_at,
            } => OperatingHours::daily(opens_at, closes_at).map_err(from_location_error),
        }
    }
}

impl From<OperatingHours> for OperatingHoursBody {
    fn from(hours: OperatingHours) -> Self {
        match hours {
            OperatingHours::AlwaysOpen => Self::AlwaysOpen,
            OperatingHours::Daily {
                opens_at,
                closes_at,
            } => Self::Daily {
                opens_at,
                closes_at,
            },
        }
    }
}

fn parse_amenities(raw: Vec<String>) -> Result<Vec<Amenity>, Error> {
    raw.iter()
        .map(|item| item.parse::<Amenity>().map_err(from_location_error))
        .collect()
}

fn parse_status(raw: &str) -> Result<LocationStatus, Error> {
    raw.parse::<LocationStatus>().map_err(from_location_error)
}

/// Body for `POST /api/v1/locations`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    #[schema(example = "Harbour Street Car Park")]
    pub name: String,
    #[schema(example = "12 Harbour Street, Leith")]
    pub address: String,
    #[schema(example = 55.9765)]
    pub latitude: f64,
    #[schema(example = json!(-3.1701))]
    pub longitude: f64,
    #[schema(example = 120)]
    pub total_spaces: u32,
    #[schema(example = 250)]
    pub hourly_rate_cents: i64,
    /// Defaults to always open.
    pub operating_hours: Option<OperatingHoursBody>,
    #[serde(default)]
    #[schema(example = json!(["covered", "ev_charging"]))]
    pub amenities: Vec<String>,
    /// Defaults to `active`.
    pub status: Option<String>,
}

impl TryFrom<CreateLocationRequest> for ParkingLocationDraft {
    type Error = Error;

    fn try_from(body: CreateLocationRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: body.name,
            address: body.address,
            latitude: body.latitude,
            longitude: body.longitude,
            total_spaces: body.total_spaces,
            hourly_rate_cents: body.hourly_rate_cents,
            operating_hours: body
                .operating_hours
                .map(OperatingHoursBody::into_domain)
                .transpose()?
                .unwrap_or(OperatingHours::AlwaysOpen),
            amenities: parse_amenities(body.amenities)?,
            status: body
                .status
                .as_deref()
                .map(parse_status)
                .transpose()?
                .unwrap_or(LocationStatus::Active),
        })
    }
}

/// Body for `PATCH /api/v1/locations/{id}`; omitted fields stay unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub total_spaces: Option<u32>,
    pub hourly_rate_cents: Option<i64>,
    pub operating_hours: Option<OperatingHoursBody>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<String>,
}

impl TryFrom<UpdateLocationRequest> for ParkingLocationPatch {
    type Error = Error;

    fn try_from(body: UpdateLocationRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: body.name,
            address: body.address,
            latitude: body.latitude,
            longitude: body.longitude,
            total_spaces: body.total_spaces,
            hourly_rate_cents: body.hourly_rate_cents,
            operating_hours: body
                .operating_hours
                .map(OperatingHoursBody::into_domain)
                .transpose()?,
            amenities: body.amenities.map(parse_amenities).transpose()?,
            status: body.status.as_deref().map(parse_status).transpose()?,
        })
    }
}

/// Location with live availability.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    #[schema(example = "9b2f0d1e-7c4a-4e0b-8d55-0f3c2a1b6e77")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_spaces: u32,
    /// Spaces free for the coming minute.
    pub available_spaces: u32,
    pub hourly_rate_cents: i64,
    pub operating_hours: OperatingHoursBody,
    pub amenities: Vec<String>,
    #[schema(example = "active")]
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl LocationResponse {
    fn build(location: ParkingLocation, available_spaces: u32) -> Self {
        let coordinates = location.coordinates();
        Self {
            id: location.id().to_string(),
            name: location.name().to_string(),
            address: location.address().to_string(),
            latitude: coordinates.latitude(),
            longitude: coordinates.longitude(),
            total_spaces: location.total_spaces().get(),
            available_spaces,
            hourly_rate_cents: location.hourly_rate().cents(),
            operating_hours: location.operating_hours().into(),
            amenities: location
                .amenities()
                .as_slice()
                .iter()
                .map(|amenity| amenity.as_str().to_owned())
                .collect(),
            status: location.status().as_str().to_owned(),
            created_at: location.created_at().to_rfc3339(),
            updated_at: location.updated_at().to_rfc3339(),
        }
    }
}

impl From<LocationView> for LocationResponse {
    fn from(view: LocationView) -> Self {
        Self::build(view.location, view.available_spaces)
    }
}

/// Nearby search hit.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyLocationResponse {
    #[serde(flatten)]
    pub location: LocationResponse,
    /// Great-circle distance from the search centre.
    #[schema(example = 0.42)]
    pub distance_km: f64,
}

impl From<NearbyLocation> for NearbyLocationResponse {
    fn from(hit: NearbyLocation) -> Self {
        Self {
            location: LocationResponse::build(hit.location, hit.available_spaces),
            distance_km: hit.distance_km,
        }
    }
}

/// Availability and price for a prospective booking window.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub location_id: String,
    pub start_time: String,
    pub end_time: String,
    pub total_spaces: u32,
    /// Most spaces taken at any instant of the window.
    pub peak_occupied: u32,
    pub available_spaces: u32,
    pub price_cents: i64,
}

impl From<AvailabilityQuote> for AvailabilityResponse {
    fn from(quote: AvailabilityQuote) -> Self {
        Self {
            location_id: quote.location_id.to_string(),
            start_time: quote.window.start().to_rfc3339(),
            end_time: quote.window.end().to_rfc3339(),
            total_spaces: quote.availability.total_spaces,
            peak_occupied: quote.availability.peak_occupied,
            available_spaces: quote.availability.available_spaces,
            price_cents: quote.price_cents,
        }
    }
}

/// `GET /api/v1/locations` query.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListLocationsQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// `active`, `inactive` or `maintenance`.
    pub status: Option<String>,
}

impl ListLocationsQuery {
    pub(super) fn status(&self) -> Result<Option<LocationStatus>, Error> {
        self.status.as_deref().map(parse_status).transpose()
    }
}

/// `GET /api/v1/locations/nearby` query.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NearbyParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Search radius in km, at most 50. Defaults to 5.
    pub radius_km: Option<f64>,
    /// Result cap, 1 to 100. Defaults to 20.
    pub limit: Option<usize>,
    /// Only return locations with at least this many free spaces.
    pub min_available: Option<u32>,
    pub max_hourly_rate: Option<i64>,
    /// Comma separated amenities every result must offer.
    pub amenities: Option<String>,
}

impl TryFrom<NearbyParams> for NearbyQuery {
    type Error = Error;

    fn try_from(params: NearbyParams) -> Result<Self, Self::Error> {
        let lat = require(params.lat, FieldName::new("lat"))?;
        let lng = require(params.lng, FieldName::new("lng"))?;
        let center = Coordinates::new(lat, lng).map_err(from_geo_error)?;
        let mut query = NearbyQuery::around(center);
        if let Some(km) = params.radius_km {
            query.radius = SearchRadius::new(km).map_err(from_geo_error)?;
        }
        if let Some(limit) = params.limit {
            query = query
                .with_limit(limit)
                .map_err(|err| invalid_field("limit", "invalid_limit", err.to_string()))?;
        }
        query.min_available_spaces = params.min_available;
        query.max_hourly_rate = params
            .max_hourly_rate
            .map(HourlyRate::from_cents)
            .transpose()
            .map_err(|err| invalid_field("maxHourlyRate", err.code(), err.to_string()))?;
        if let Some(raw) = params.amenities.as_deref() {
            query.required_amenities =
                AmenitySet::new(parse_csv::<Amenity>(raw, FieldName::new("amenities"))?);
        }
        Ok(query)
    }
}

/// `GET /api/v1/locations/{id}/availability` query.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityParams {
    /// RFC 3339 start of the window.
    pub start: Option<String>,
    /// RFC 3339 end of the window.
    pub end: Option<String>,
}

impl AvailabilityParams {
    pub(super) fn window(&self) -> Result<BookingWindow, Error> {
        let start_field = FieldName::new("start");
        let end_field = FieldName::new("end");
        let start = parse_rfc3339_timestamp(require(self.start.as_deref(), start_field)?, start_field)?;
        let end = parse_rfc3339_timestamp(require(self.end.as_deref(), end_field)?, end_field)?;
        BookingWindow::new(start, end)
            .map_err(|err| invalid_field("end", "invalid_window", err.to_string()))
    }
}
