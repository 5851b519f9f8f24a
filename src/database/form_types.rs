//! Write-value types

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::posts::ReferenceSnapshot;
use crate::users::User;
use crate::users::ViewPreference;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The normalized email address
    pub email: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,
}

/// Values to create an Entry
///
/// `created_at` and `day_key` come from one clock sample; there is no
/// update counterpart, entries are immutable.
pub struct CreateEntryValues<'a> {
    /// User creating the entry
    pub user: &'a User,

    /// Validated entry text
    pub body_text: &'a str,

    /// Creation instant
    pub created_at: NaiveDateTime,

    /// Day key derived from the same instant
    pub day_key: NaiveDate,
}

/// Values to create a Post draft
pub struct CreatePostValues<'a> {
    /// User creating the post
    pub user: &'a User,

    /// Initial title
    pub title: &'a str,

    /// Initial body text
    pub body_text: &'a str,

    /// Initial structured document
    pub content_json: Option<&'a Value>,

    /// Initial reference snapshots
    pub reference_snapshots: &'a [ReferenceSnapshot],
}

/// Values to save a Post draft
///
/// All fields are optional and are not touched when not provided.
pub struct SavePostValues<'a> {
    /// New title
    pub title: Option<&'a str>,

    /// New body text
    pub body_text: Option<&'a str>,

    /// New structured document
    pub content_json: Option<&'a Value>,

    /// New rendered HTML
    pub content_html: Option<&'a str>,

    /// New excerpt
    pub excerpt: Option<&'a str>,

    /// New cover image URL
    pub cover_image: Option<&'a str>,

    /// New featured flag
    pub is_featured: Option<bool>,

    /// New grid layout hint
    pub grid_size: Option<&'a str>,

    /// New snapshot set
    pub reference_snapshots: Option<&'a [ReferenceSnapshot]>,
}

/// Values computed by the publish derivation
///
/// Everything is derived up front and persisted in one statement; a failed
/// derivation persists nothing.
pub struct PublishPostValues<'a> {
    /// Resolved unique slug
    pub slug: &'a str,

    /// Excerpt, derived when it was unset
    pub excerpt: &'a str,

    /// Derived reading time in minutes
    pub reading_time: i32,

    /// Publish instant, only stored when none is set yet
    pub published_at: NaiveDateTime,
}

/// Values to update a user's profile settings
pub struct UpdateUserValues {
    /// New view preference
    pub view_preference: Option<ViewPreference>,
}
