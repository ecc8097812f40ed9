//! UUID-backed identifiers shared by the domain entities.

use uuid::Uuid;

/// Failure parsing an identifier from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    /// The input was empty.
    #[error("identifier must not be empty")]
    Empty,
    /// The input carried whitespace or was not a UUID.
    #[error("identifier must be a valid UUID")]
    Invalid,
}

pub(crate) fn parse_uuid_text(raw: &str) -> Result<Uuid, IdParseError> {
    if raw.is_empty() {
        return Err(IdParseError::Empty);
    }
    if raw.trim() != raw {
        return Err(IdParseError::Invalid);
    }
    Uuid::parse_str(raw).map_err(|_| IdParseError::Invalid)
}

macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Parse an identifier from its hyphenated UUID form.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, $crate::domain::IdParseError> {
                $crate::domain::ids::parse_uuid_text(raw.as_ref()).map(Self)
            }

            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::domain::IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::domain::IdParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

pub(crate) use define_uuid_id;
