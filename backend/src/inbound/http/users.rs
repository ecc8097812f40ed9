//! Account handlers: registration, session login/logout and user lookups.
//!
//! ```text
//! POST /api/v1/users   {"name":"Ada Lovelace","email":"ada@example.com"}
//! POST /api/v1/login   {"email":"ada@example.com"}
//! POST /api/v1/logout
//! GET  /api/v1/users/me
//! GET  /api/v1/users/{id}
//! GET  /api/v1/users?limit=20&offset=0
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{EmailAddress, NewUser, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_actor;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, from_user_error, page_request, parse_id};

/// Registration body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "+44 20 7946 0958")]
    pub phone: Option<String>,
}

/// Login body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
}

/// User as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[schema(example = "user")]
    pub role: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.to_string(),
            email: user.email.to_string(),
            phone: user.phone.map(String::from),
            role: user.role.as_str().to_owned(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Pagination query shared by list endpoints.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page size, 1 to 100.
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Create an account and start a session for it.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "registerUser",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest { name, email, phone } = payload.into_inner();
    let draft = NewUser::try_from_parts(name, email, phone).map_err(from_user_error)?;
    let user = state.accounts.register(draft).await?;
    session.persist_user(&user.id)?;
    info!(user_id = %user.id, "account registered");
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Establish a session for an existing account.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unknown account", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let email = EmailAddress::new(payload.into_inner().email).map_err(from_user_error)?;
    let user = state.accounts.login(email).await?;
    session.persist_user(&user.id)?;
    Ok(web::Json(user.into()))
}

/// Drop the current session. Succeeds whether or not one existed.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let actor = require_actor(&state, &session).await?;
    let user = state.accounts_query.get_user(&actor, &actor.user_id).await?;
    Ok(web::Json(user.into()))
}

/// Fetch a user; callers may read themselves, admins may read anyone.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let actor = require_actor(&state, &session).await?;
    let id: UserId = parse_id(&path, FieldName::new("id"))?;
    let user = state.accounts_query.get_user(&actor, &id).await?;
    Ok(web::Json(user.into()))
}

/// List accounts. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let actor = require_actor(&state, &session).await?;
    let page = page_request(query.limit, query.offset)?;
    let users = state.accounts_query.list_users(&actor, page).await?;
    Ok(web::Json(users.into_iter().map(UserResponse::from).collect()))
}
