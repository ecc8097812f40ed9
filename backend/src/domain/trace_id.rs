//! Correlation id carried by every request.
//!
//! The HTTP `Trace` middleware opens a [`TraceId::scope`] around each
//! request, so anything that runs inside the handler future (services,
//! repositories, [`crate::domain::Error`] constructors) can read the id with
//! [`TraceId::current`] and stamp it onto logs and error payloads.
//!
//! The id lives in Tokio task-local storage and does not follow work onto a
//! freshly spawned task. Wrap the spawned future in `scope` again if it needs
//! the id.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use uuid::Uuid;

tokio::task_local! {
    static CURRENT: TraceId;
}

/// Request correlation id, rendered as a hyphenated UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random id for a new request.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The id of the enclosing [`TraceId::scope`], if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Drive `fut` to completion with `id` as the current trace id.
    ///
    /// ```
    /// use parkspot::domain::TraceId;
    ///
    /// # tokio::runtime::Builder::new_current_thread().build().map(|rt| rt.block_on(async {
    /// let id = TraceId::generate();
    /// assert_eq!(TraceId::scope(id, async { TraceId::current() }).await, Some(id));
    /// # })).ok();
    /// ```
    pub async fn scope<F: Future>(id: Self, fut: F) -> F::Output {
        CURRENT.scope(id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw).map(Self)
    }
}
