//! Booking entity, reservation windows and status transitions.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ids::define_uuid_id;
use super::parking_location::{HourlyRate, ParkingLocationId};
use super::user::{Actor, UserId};

define_uuid_id! {
    /// Stable booking identifier.
    BookingId
}

/// Validation failures for booking input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingValidationError {
    #[error("vehicle plate must contain 2 to 10 letters or digits")]
    InvalidPlate,
    #[error("booking must end after it starts")]
    EmptyWindow,
    #[error("unknown vehicle type: {0}")]
    UnknownVehicleType(String),
    #[error("unknown booking status: {0}")]
    UnknownStatus(String),
}

impl BookingValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidPlate => "vehiclePlate",
            Self::EmptyWindow => "endTime",
            Self::UnknownVehicleType(_) => "vehicleType",
            Self::UnknownStatus(_) => "status",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPlate => "invalid_plate",
            Self::EmptyWindow => "invalid_window",
            Self::UnknownVehicleType(_) => "unknown_vehicle_type",
            Self::UnknownStatus(_) => "unknown_status",
        }
    }
}

static PLATE_RE: OnceLock<Regex> = OnceLock::new();

/// Normalised vehicle registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct VehiclePlate(String);

impl VehiclePlate {
    /// Upper-case the plate, drop spaces and dashes, then validate.
    ///
    /// # Examples
    /// ```
    /// use parkspot::domain::VehiclePlate;
    ///
    /// let plate = VehiclePlate::new("ab12 c-de").expect("valid plate");
    /// assert_eq!(plate.as_ref(), "AB12CDE");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BookingValidationError> {
        let plate: String = raw
            .as_ref()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .flat_map(char::to_uppercase)
            .collect();
        let pattern = PLATE_RE.get_or_init(|| {
            Regex::new("^[A-Z0-9]{2,10}$")
                .unwrap_or_else(|error| panic!("plate regex failed to compile: {error}"))
        });
        if !pattern.is_match(&plate) {
            return Err(BookingValidationError::InvalidPlate);
        }
        Ok(Self(plate))
    }
}

impl AsRef<str> for VehiclePlate {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<VehiclePlate> for String {
    fn from(value: VehiclePlate) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Van,
    Ev,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Motorcycle => "motorcycle",
            Self::Van => "van",
            Self::Ev => "ev",
        }
    }
}

impl std::str::FromStr for VehicleType {
    type Err = BookingValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(Self::Car),
            "motorcycle" => Ok(Self::Motorcycle),
            "van" => Ok(Self::Van),
            "ev" => Ok(Self::Ev),
            other => Err(BookingValidationError::UnknownVehicleType(other.to_owned())),
        }
    }
}

/// Half-open reservation interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookingWindow {
    #[serde(rename = "startTime")]
    start: DateTime<Utc>,
    #[serde(rename = "endTime")]
    end: DateTime<Utc>,
}

impl BookingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, BookingValidationError> {
        if start >= end {
            return Err(BookingValidationError::EmptyWindow);
        }
        Ok(Self { start, end })
    }

    /// The one-minute window used for "spaces free right now".
    pub fn minute_from(now: DateTime<Utc>) -> Self {
        Self {
            start: now,
            end: now + Duration::minutes(1),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Back-to-back windows share an endpoint and do not overlap.
    pub fn overlaps(&self, other: &BookingWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length in whole minutes, partial minutes rounded up.
    pub fn duration_minutes(&self) -> i64 {
        let seconds = self.duration().num_seconds();
        let nanos_remainder = self.duration().subsec_nanos() > 0;
        let minutes = seconds / 60;
        if seconds % 60 > 0 || nanos_remainder {
            minutes + 1
        } else {
            minutes
        }
    }
}

/// Price of a window at `rate`, rounded up to the next cent.
///
/// # Examples
/// ```
/// use parkspot::domain::{BookingWindow, HourlyRate, quote_price};
///
/// let window = BookingWindow::new(
///     "2025-03-01T09:00:00Z".parse().expect("start"),
///     "2025-03-01T09:50:00Z".parse().expect("end"),
/// )
/// .expect("valid window");
/// let rate = HourlyRate::from_cents(200).expect("valid rate");
/// assert_eq!(quote_price(rate, &window), 167);
/// ```
pub fn quote_price(rate: HourlyRate, window: &BookingWindow) -> i64 {
    let numerator = window.duration_minutes().saturating_mul(rate.cents());
    numerator.div_euclid(60) + i64::from(numerator.rem_euclid(60) > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::CheckedIn => "checked_in",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses that hold a space for their window.
    pub fn is_occupying(self) -> bool {
        matches!(self, Self::Confirmed | Self::CheckedIn)
    }

    pub const OCCUPYING: [BookingStatus; 2] = [Self::Confirmed, Self::CheckedIn];
}

impl std::str::FromStr for BookingStatus {
    type Err = BookingValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "checked_in" => Ok(Self::CheckedIn),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(BookingValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Cancel,
    CheckIn,
    Complete,
}

/// Why a status change was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("booking belongs to another user")]
    NotOwner,
    #[error("cannot {action} a booking that is {from}")]
    InvalidState { action: &'static str, from: &'static str },
    #[error("booking has already started and can no longer be cancelled")]
    AlreadyStarted,
    #[error("check-in opens at {opens_at}")]
    TooEarly { opens_at: DateTime<Utc> },
    #[error("booking window has ended")]
    WindowEnded,
}

impl BookingAction {
    fn verb(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::CheckIn => "check in",
            Self::Complete => "complete",
        }
    }

    /// Status a successful action moves the booking to.
    pub fn target(self) -> BookingStatus {
        match self {
            Self::Cancel => BookingStatus::Cancelled,
            Self::CheckIn => BookingStatus::CheckedIn,
            Self::Complete => BookingStatus::Completed,
        }
    }
}

/// A reservation of one space at one location for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub user_id: UserId,
    pub location_id: ParkingLocationId,
    pub vehicle_plate: VehiclePlate,
    pub vehicle_type: VehicleType,
    #[serde(flatten)]
    pub window: BookingWindow,
    pub total_price_cents: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_occupying(&self) -> bool {
        self.status.is_occupying()
    }

    /// Validate that `actor` may perform `action` at `now`.
    ///
    /// Returns the status the booking should move to. `check_in_grace` is how
    /// long before the window starts check-in opens.
    pub fn authorise(
        &self,
        action: BookingAction,
        actor: &Actor,
        now: DateTime<Utc>,
        check_in_grace: Duration,
    ) -> Result<BookingStatus, TransitionError> {
        let owner = actor.user_id == self.user_id;
        let invalid = || TransitionError::InvalidState {
            action: action.verb(),
            from: self.status.as_str(),
        };
        match action {
            BookingAction::Cancel => {
                if !owner && !actor.is_admin() {
                    return Err(TransitionError::NotOwner);
                }
                if self.status != BookingStatus::Confirmed {
                    return Err(invalid());
                }
                if !actor.is_admin() && now >= self.window.start() {
                    return Err(TransitionError::AlreadyStarted);
                }
            }
            BookingAction::CheckIn => {
                if !owner {
                    return Err(TransitionError::NotOwner);
                }
                if self.status != BookingStatus::Confirmed {
                    return Err(invalid());
                }
                let opens_at = self.window.start() - check_in_grace;
                if now < opens_at {
                    return Err(TransitionError::TooEarly { opens_at });
                }
                if now >= self.window.end() {
                    return Err(TransitionError::WindowEnded);
                }
            }
            BookingAction::Complete => {
                if !owner && !actor.is_admin() {
                    return Err(TransitionError::NotOwner);
                }
                if self.status != BookingStatus::CheckedIn {
                    return Err(invalid());
                }
            }
        }
        Ok(action.target())
    }
}
