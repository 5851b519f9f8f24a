//! Session endpoints
//!
//! Registration and the token exchange. Tokens are stateless; logout is a
//! client-side affair and the endpoint only exists to make that explicit.

use axum::Extension;
use serde::Deserialize;

use crate::database::CreateUserValues;
use crate::database::Database;
use crate::password::hash;
use crate::password::verify;
use crate::users::validate_email;
use crate::users::validate_password;

use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;
use super::current_user::TokenPair;
use super::current_user::generate_token_pair;
use super::current_user::verify_refresh_token;
use super::users::UserResponse;

/// Registration form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// Email address of the new user
    email: String,
    /// Password of the new user
    password: String,
}

/// A freshly registered user with its first token pair
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// The new user
    user: UserResponse,
    /// Token pair, ready to use
    token: TokenPair,
}

/// Register a new user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "email": "jane@example.com", "password": "verysecret" }' \
///     http://localhost:6000/api/session/register
/// ```
pub async fn register(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(database): Extension<Database>,
    Form(form): Form<RegisterForm>,
) -> Result<Success<RegisterResponse>, Error> {
    let email = validate_email(&form.email).map_err(Error::bad_request)?;
    validate_password(&form.password).map_err(Error::bad_request)?;

    let existing = database
        .find_single_user_by_email(&email)
        .await
        .map_err(Error::internal_server_error)?;

    if existing.is_some() {
        return Err(Error::conflict("Email already registered"));
    }

    let hashed_password = hash(&form.password);

    let values = CreateUserValues {
        email: &email,
        hashed_password: &hashed_password,
    };

    let user = database
        .create_user(&values)
        .await
        .map_err(Error::internal_server_error)?;

    let token = generate_token_pair(&jwt_keys, user.id, &user.email)?;

    Ok(Success::created(RegisterResponse {
        user: UserResponse::from_user(user),
        token,
    }))
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Email address of the user
    email: String,
    /// Password of the user
    password: String,
}

/// Get a token pair for a user "session"
///
/// The access token can then be used on the rest of the API routes through
/// the `Authorization` header; the refresh token mints new pairs.
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "email": "jane@example.com", "password": "verysecret" }' \
///     http://localhost:6000/api/session/token
/// ```
///
/// Response:
/// ```json
/// { "data": { "token_type": "Bearer", "access_token": "some token", ... } }
/// ```
pub async fn token(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(database): Extension<Database>,
    Form(form): Form<LoginForm>,
) -> Result<Success<TokenPair>, Error> {
    let email = form.email.trim().to_lowercase();

    let user = database
        .find_single_user_by_email(&email)
        .await
        .map_err(Error::internal_server_error)?;

    // same error for unknown email and wrong password
    if let Some(user) = user {
        if verify(&user.hashed_password, &form.password) {
            let token = generate_token_pair(&jwt_keys, user.id, &user.email)?;

            Ok(Success::ok(token))
        } else {
            Err(Error::bad_request("Invalid credentials"))
        }
    } else {
        Err(Error::bad_request("Invalid credentials"))
    }
}

/// Refresh form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshForm {
    /// A refresh token from an earlier pair
    refresh_token: String,
}

/// Trade a refresh token for a fresh token pair
pub async fn refresh(
    Extension(jwt_keys): Extension<JwtKeys>,
    Form(form): Form<RefreshForm>,
) -> Result<Success<TokenPair>, Error> {
    let identity = verify_refresh_token(&jwt_keys, &form.refresh_token)?;

    let token = generate_token_pair(&jwt_keys, identity.user_id, &identity.email)?;

    Ok(Success::ok(token))
}

/// End a "session"
///
/// Tokens are stateless, there is nothing to revoke server-side; clients
/// drop their pair.
pub async fn logout() -> Result<Success<&'static str>, Error> {
    Ok(Success::<&'static str>::no_content())
}
