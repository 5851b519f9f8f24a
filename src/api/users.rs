//! User profile endpoints

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::database::Database;
use crate::database::UpdateUserValues;
use crate::users::User;
use crate::users::ViewPreference;
use crate::users::derive_handle_base;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::Success;

/// The user response information
///
/// A subset of all the information, ready to be serialized for the outside
/// world
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// The user ID
    pub id: Uuid,

    /// The email address
    pub email: String,

    /// The public handle, when allocated
    pub username: Option<String>,

    /// Public profile layout
    pub view_preference: ViewPreference,

    /// Creation date
    pub created_at: NaiveDateTime,
}

impl UserResponse {
    /// Create a user response from a [`User`](User)
    pub fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            view_preference: user.view_preference,
            created_at: user.created_at,
        }
    }
}

/// Get the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me
/// ```
pub async fn me(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<UserResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;

    Ok(Success::ok(UserResponse::from_user(user)))
}

/// Update profile settings form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserForm {
    /// New view preference
    view_preference: Option<ViewPreference>,
}

/// Update the current user's profile settings
pub async fn update_me(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<UpdateUserForm>,
) -> Result<Success<UserResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;

    let values = UpdateUserValues {
        view_preference: form.view_preference,
    };

    let updated_user = database
        .update_user(&user, &values)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(UserResponse::from_user(updated_user)))
}

/// Make sure the current user has a public handle
///
/// Idempotent: an existing handle is returned untouched, it is permanent.
/// Otherwise one is derived from the email address and made unique with a
/// numeric suffix.
pub async fn ensure_handle(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<UserResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;

    if user.username.is_some() {
        return Ok(Success::ok(UserResponse::from_user(user)));
    }

    let base = derive_handle_base(&user.email, &user.id);

    let mut candidate = base.clone();
    let mut counter = 1;

    loop {
        let taken = database
            .find_single_user_by_username(&candidate)
            .await
            .map_err(Error::internal_server_error)?;

        if taken.is_none() {
            break;
        }

        candidate = format!("{base}{counter}");
        counter += 1;
    }

    let updated_user = database
        .set_username(&user, &candidate)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(UserResponse::from_user(updated_user)))
}

/// Fetch the full user row behind a verified identity
///
/// The token outliving the account is the only way this fails.
pub async fn fetch_current_user(
    database: &Database,
    current_user: &CurrentUser,
) -> Result<User, Error> {
    database
        .find_single_user_by_id(&current_user.user_id)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::unauthorized("Unknown user")), Ok)
}
