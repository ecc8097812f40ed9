//! Caller resolution for handlers that need an [`Actor`].
//!
//! The session only stores a user id; the role is looked up on every request
//! so demotions and deleted accounts take effect immediately.

use crate::domain::Actor;

use super::ApiResult;
use super::session::SessionContext;
use super::state::HttpState;

/// Resolve the session's user into an [`Actor`] or fail with `401`.
pub async fn require_actor(state: &HttpState, session: &SessionContext) -> ApiResult<Actor> {
    let user_id = session.require_user_id()?;
    state.accounts_query.actor(&user_id).await
}
