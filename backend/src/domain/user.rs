//! User data model.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ids::define_uuid_id;

define_uuid_id! {
    /// Stable user identifier stored as a UUID.
    UserId
}

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyName,
    NameTooShort { min: usize },
    NameTooLong { max: usize },
    NameInvalidCharacters,
    EmptyEmail,
    EmailTooLong { max: usize },
    InvalidEmail,
    InvalidPhone,
    UnknownRole(String),
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooShort { min } => write!(f, "name must be at least {min} characters"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::NameInvalidCharacters => write!(
                f,
                "name may only contain letters, numbers, spaces, dots, apostrophes, or hyphens",
            ),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email must look like name@example.com"),
            Self::InvalidPhone => write!(
                f,
                "phone must contain 7 to 15 digits with an optional leading +",
            ),
            Self::UnknownRole(raw) => write!(f, "unknown role: {raw}"),
        }
    }
}

impl std::error::Error for UserValidationError {}

impl UserValidationError {
    /// Request field the failure relates to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyName
            | Self::NameTooShort { .. }
            | Self::NameTooLong { .. }
            | Self::NameInvalidCharacters => "name",
            Self::EmptyEmail | Self::EmailTooLong { .. } | Self::InvalidEmail => "email",
            Self::InvalidPhone => "phone",
            Self::UnknownRole(_) => "role",
        }
    }

    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyName => "empty_name",
            Self::NameTooShort { .. } => "name_too_short",
            Self::NameTooLong { .. } => "name_too_long",
            Self::NameInvalidCharacters => "invalid_name",
            Self::EmptyEmail => "empty_email",
            Self::EmailTooLong { .. } => "email_too_long",
            Self::InvalidEmail => "invalid_email",
            Self::InvalidPhone => "invalid_phone",
            Self::UnknownRole(_) => "invalid_role",
        }
    }
}

/// Minimum allowed length for a user name.
pub const USER_NAME_MIN: usize = 2;
/// Maximum allowed length for a user name.
pub const USER_NAME_MAX: usize = 50;
/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 254;

static USER_NAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern).unwrap_or_else(|error| panic!("regex {pattern} failed to compile: {error}"))
    })
}

/// Human readable name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validate and construct a [`UserName`]; surrounding whitespace is trimmed.
    pub fn new(name: impl Into<String>) -> Result<Self, UserValidationError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        let length = name.chars().count();
        if length < USER_NAME_MIN {
            return Err(UserValidationError::NameTooShort { min: USER_NAME_MIN });
        }
        if length > USER_NAME_MAX {
            return Err(UserValidationError::NameTooLong { max: USER_NAME_MAX });
        }
        // Length is enforced above; the pattern constrains characters only.
        if !compiled(&USER_NAME_RE, r"^[\p{L}\p{N} .'\-]+$").is_match(&name) {
            return Err(UserValidationError::NameInvalidCharacters);
        }
        Ok(Self(name))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lower-cased email address used as the login handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use parkspot::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new(" Ada@Example.COM ").expect("valid email");
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into().trim().to_lowercase();
        if email.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if email.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !compiled(&EMAIL_RE, r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_match(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Contact phone number with separators removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Strip spaces and dashes then validate 7..=15 digits with an optional `+`.
    pub fn new(phone: impl Into<String>) -> Result<Self, UserValidationError> {
        let phone: String = phone
            .into()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if !compiled(&PHONE_RE, r"^\+?[0-9]{7,15}$").is_match(&phone) {
            return Err(UserValidationError::InvalidPhone);
        }
        Ok(Self(phone))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Authorisation role attached to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    /// Wire and storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Registered account.
///
/// ## Invariants
/// - `email` is unique across users and stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: EmailAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<PhoneNumber>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// True when the user holds the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Validated registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: UserName,
    pub email: EmailAddress,
    pub phone: Option<PhoneNumber>,
}

impl NewUser {
    /// Validate raw registration fields.
    pub fn try_from_parts(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self {
            name: UserName::new(name)?,
            email: EmailAddress::new(email)?,
            phone: phone
                .filter(|raw| !raw.trim().is_empty())
                .map(PhoneNumber::new)
                .transpose()?,
        })
    }
}

/// Authenticated caller passed to driving ports that need authorisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Actor {
    /// Build an actor from a loaded user.
    pub fn of(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }

    /// True when the actor is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// True when the actor is the given user or an administrator.
    pub fn may_access(&self, owner: &UserId) -> bool {
        self.is_admin() || self.user_id == *owner
    }
}

#[cfg(test)]
mod tests;
