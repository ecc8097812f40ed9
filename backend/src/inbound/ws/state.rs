//! Shared WebSocket adapter state.

use std::sync::Arc;

use url::Url;

use crate::domain::ports::LocationsQuery;

use super::rooms::RoomRegistry;

/// Origin accepted on the WebSocket upgrade, compared by scheme, host and
/// port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigin(url::Origin);

impl AllowedOrigin {
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Url::parse(raw).map(|url| Self(url.origin()))
    }

    pub fn matches(&self, origin: &Url) -> bool {
        self.0 == origin.origin()
    }
}

/// Dependency bundle for the upgrade handler and per-connection sessions.
#[derive(Clone)]
pub struct WsState {
    pub locations_query: Arc<dyn LocationsQuery>,
    pub rooms: Arc<RoomRegistry>,
    pub allowed_origins: Arc<[AllowedOrigin]>,
}

impl WsState {
    pub fn new(
        locations_query: Arc<dyn LocationsQuery>,
        rooms: Arc<RoomRegistry>,
        allowed_origins: impl IntoIterator<Item = AllowedOrigin>,
    ) -> Self {
        Self {
            locations_query,
            rooms,
            allowed_origins: allowed_origins.into_iter().collect(),
        }
    }

    pub fn is_allowed(&self, origin: &Url) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed.matches(origin))
    }
}
