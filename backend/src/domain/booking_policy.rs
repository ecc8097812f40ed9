//! Tunable rules applied when creating and checking in bookings.

use chrono::Duration;

use super::booking::BookingWindow;

/// Booking rules sourced from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    min_duration: Duration,
    max_duration: Duration,
    check_in_grace: Duration,
    past_start_tolerance: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingPolicyError {
    #[error("minimum booking duration must be at least one minute")]
    MinTooShort,
    #[error("maximum booking duration must not be shorter than the minimum")]
    MaxBelowMin,
    #[error("durations must not be negative")]
    Negative,
    #[error("{minutes} minutes is beyond the representable duration range")]
    OutOfRange { minutes: i64 },
}

fn minutes(value: i64) -> Result<Duration, BookingPolicyError> {
    Duration::try_minutes(value).ok_or(BookingPolicyError::OutOfRange { minutes: value })
}

/// A window that breaks the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    StartInPast,
    TooShort { min_minutes: i64 },
    TooLong { max_minutes: i64 },
}

impl PolicyViolation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StartInPast => "start_in_past",
            Self::TooShort { .. } => "duration_too_short",
            Self::TooLong { .. } => "duration_too_long",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::StartInPast => "booking cannot start in the past".to_owned(),
            Self::TooShort { min_minutes } => {
                format!("booking must last at least {min_minutes} minutes")
            }
            Self::TooLong { max_minutes } => {
                format!("booking must last at most {max_minutes} minutes")
            }
        }
    }
}

impl BookingPolicy {
    /// Build a policy from whole minutes.
    pub fn from_minutes(
        min_duration: i64,
        max_duration: i64,
        check_in_grace: i64,
        past_start_tolerance: i64,
    ) -> Result<Self, BookingPolicyError> {
        if check_in_grace < 0 || past_start_tolerance < 0 {
            return Err(BookingPolicyError::Negative);
        }
        if min_duration < 1 {
            return Err(BookingPolicyError::MinTooShort);
        }
        if max_duration < min_duration {
            return Err(BookingPolicyError::MaxBelowMin);
        }
        Ok(Self {
            min_duration: minutes(min_duration)?,
            max_duration: minutes(max_duration)?,
            check_in_grace: minutes(check_in_grace)?,
            past_start_tolerance: minutes(past_start_tolerance)?,
        })
    }

    pub fn check_in_grace(&self) -> Duration {
        self.check_in_grace
    }

    /// Check a requested window against the clock and duration limits.
    pub fn validate(
        &self,
        window: &BookingWindow,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), PolicyViolation> {
        if window.start() < now - self.past_start_tolerance {
            return Err(PolicyViolation::StartInPast);
        }
        let duration = window.duration();
        if duration < self.min_duration {
            return Err(PolicyViolation::TooShort {
                min_minutes: self.min_duration.num_minutes(),
            });
        }
        if duration > self.max_duration {
            return Err(PolicyViolation::TooLong {
                max_minutes: self.max_duration.num_minutes(),
            });
        }
        Ok(())
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            min_duration: Duration::minutes(30),
            max_duration: Duration::hours(24),
            check_in_grace: Duration::minutes(15),
            past_start_tolerance: Duration::minutes(5),
        }
    }
}
