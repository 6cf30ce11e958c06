//! Registration API handlers.
//!
//! ```text
//! POST /register {"name":"Ada","email":"ada@example.com"}
//! GET /users
//! ```
//!
//! The handlers perform the request-shape checks the domain deliberately does
//! not (field presence, email shape), then delegate to the registration
//! service and translate its outcome taxonomy onto status codes: duplicate
//! email to 409, lock timeout to 503, store faults to 500.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::ports::StoreError;
use crate::domain::{Email, Error, RegistrationError, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpRegistration;

/// Registration request body for `POST /register`.
///
/// Example JSON:
/// `{"name":"Ada","email":"ada@example.com"}`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name; opaque apart from being non-blank.
    pub name: String,
    /// Email address; must look like an address, stored as given.
    pub email: String,
}

/// Response body for a successful registration.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    /// Always `"ok"`.
    pub status: String,
    /// The record as persisted, including assigned id and timestamp.
    pub user: User,
}

/// Response body for `GET /users`.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserListResponse {
    /// Number of registered users.
    pub count: usize,
    /// The full collection in registration order.
    pub users: Vec<User>,
}

fn empty_field_error(field: &'static str) -> Error {
    Error::invalid_request(format!("{field} must not be empty")).with_details(json!({
        "field": field,
        "code": "empty_field",
    }))
}

fn invalid_email_error(value: &str) -> Error {
    Error::invalid_request("email must be a valid address").with_details(json!({
        "field": "email",
        "value": value,
        "code": "invalid_email",
    }))
}

/// Light shape check; deliverability is out of scope.
fn looks_like_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn validate(request: &RegisterRequest) -> Result<(), Error> {
    if request.name.trim().is_empty() {
        return Err(empty_field_error("name"));
    }
    if request.email.is_empty() {
        return Err(empty_field_error("email"));
    }
    if !looks_like_email(&request.email) {
        return Err(invalid_email_error(&request.email));
    }
    Ok(())
}

fn map_registration_error(err: RegistrationError) -> Error {
    match err {
        RegistrationError::DuplicateEmail { email } => Error::conflict("email already registered")
            .with_details(json!({ "email": email.as_str(), "code": "duplicate_email" })),
        RegistrationError::Store(StoreError::LockTimeout { waited_ms }) => {
            Error::service_unavailable("store is busy, retry shortly")
                .with_details(json!({ "code": "lock_timeout", "waited_ms": waited_ms }))
        }
        RegistrationError::Store(fault) => Error::internal(fault.to_string()),
    }
}

/// Register a new user.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 503, description = "Store busy", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "register"
)]
#[post("/register")]
pub async fn register(
    service: web::Data<HttpRegistration>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    validate(&request)?;

    let user = service
        .register(request.name, Email::new(request.email))
        .await
        .map_err(map_registration_error)?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        status: "ok".into(),
        user,
    }))
}

/// List registered users.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users", body = UserListResponse),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(service: web::Data<HttpRegistration>) -> ApiResult<web::Json<UserListResponse>> {
    let users = service.list_users().await.map_err(map_registration_error)?;
    Ok(web::Json(UserListResponse {
        count: users.len(),
        users,
    }))
}
