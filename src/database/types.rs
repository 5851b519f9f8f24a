//! Database row types and conversions

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use sqlx::migrate::Migrator;
use sqlx::types::Json;
use uuid::Uuid;

use crate::entries::Entry;
use crate::posts::Post;
use crate::posts::PostStatus;
use crate::posts::ReferenceSnapshot;
use crate::users::User;
use crate::users::ViewPreference;

/// Migrator to run migrations on startup
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// `SQLx` type for the view preference
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "view_preference_type")]
#[sqlx(rename_all = "kebab-case")]
pub enum ViewPreferenceType {
    /// List layout
    List,

    /// Grid layout
    Grid,
}

impl ViewPreferenceType {
    /// Create the `SQLx` type from a view preference
    pub fn from_view_preference(preference: ViewPreference) -> Self {
        match preference {
            ViewPreference::List => ViewPreferenceType::List,
            ViewPreference::Grid => ViewPreferenceType::Grid,
        }
    }

    /// Create a view preference from the `SQLx` type
    pub fn to_view_preference(&self) -> ViewPreference {
        match self {
            ViewPreferenceType::List => ViewPreference::List,
            ViewPreferenceType::Grid => ViewPreference::Grid,
        }
    }
}

/// `SQLx` type for the post status
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "post_status_type")]
#[sqlx(rename_all = "kebab-case")]
pub enum PostStatusType {
    /// Draft
    Draft,

    /// Published
    Published,
}

impl PostStatusType {
    /// Create the `SQLx` type from a post status
    pub fn from_status(status: PostStatus) -> Self {
        match status {
            PostStatus::Draft => PostStatusType::Draft,
            PostStatus::Published => PostStatusType::Published,
        }
    }

    /// Create a post status from the `SQLx` type
    pub fn to_status(&self) -> PostStatus {
        match self {
            PostStatusType::Draft => PostStatus::Draft,
            PostStatusType::Published => PostStatus::Published,
        }
    }
}

/// `SQLx` version of a user
#[derive(sqlx::FromRow)]
pub struct SqlxUser {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Public handle
    pub username: Option<String>,

    /// Hashed password
    pub hashed_password: String,

    /// Profile layout
    pub view_preference: ViewPreferenceType,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// Deleted at
    pub deleted_at: Option<NaiveDateTime>,
}

impl User {
    /// Create a user from the `SQLx` version
    pub fn from_sqlx_user(user: SqlxUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            hashed_password: user.hashed_password,
            view_preference: user.view_preference.to_view_preference(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            deleted_at: user.deleted_at,
        }
    }

    /// Maybe create a user from the `SQLx` version
    pub fn from_sqlx_user_optional(user: Option<SqlxUser>) -> Option<Self> {
        user.map(Self::from_sqlx_user)
    }
}

/// `SQLx` version of an entry
#[derive(sqlx::FromRow)]
pub struct SqlxEntry {
    /// Entry ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Entry text
    pub body_text: String,

    /// Day the entry is filed under
    pub day_key: NaiveDate,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Deleted at
    pub deleted_at: Option<NaiveDateTime>,
}

impl Entry {
    /// Create an entry from the `SQLx` version
    pub fn from_sqlx_entry(entry: SqlxEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            body_text: entry.body_text,
            day_key: entry.day_key,
            created_at: entry.created_at,
            deleted_at: entry.deleted_at,
        }
    }

    /// Maybe create an entry from the `SQLx` version
    pub fn from_sqlx_entry_optional(entry: Option<SqlxEntry>) -> Option<Self> {
        entry.map(Self::from_sqlx_entry)
    }

    /// Create multiple entries from the `SQLx` version
    pub fn from_sqlx_entry_multiple(mut entries: Vec<SqlxEntry>) -> Vec<Self> {
        entries
            .drain(..)
            .map(Self::from_sqlx_entry)
            .collect::<Vec<Self>>()
    }
}

/// `SQLx` version of a post
#[derive(sqlx::FromRow)]
pub struct SqlxPost {
    /// Post ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Title
    pub title: String,

    /// Plain text body
    pub body_text: String,

    /// Structured editor document
    pub content_json: Option<serde_json::Value>,

    /// Rendered HTML body
    pub content_html: Option<String>,

    /// URL slug
    pub slug: Option<String>,

    /// Short summary
    pub excerpt: Option<String>,

    /// Reading time in minutes
    pub reading_time: Option<i32>,

    /// Cover image URL
    pub cover_image: Option<String>,

    /// Featured flag
    pub is_featured: bool,

    /// Grid layout hint
    pub grid_size: Option<String>,

    /// Lifecycle status
    pub status: PostStatusType,

    /// Embedded reference snapshots
    pub reference_snapshots: Json<Vec<ReferenceSnapshot>>,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// First publish instant
    pub published_at: Option<NaiveDateTime>,

    /// Deleted at
    pub deleted_at: Option<NaiveDateTime>,
}

impl Post {
    /// Create a post from the `SQLx` version
    pub fn from_sqlx_post(post: SqlxPost) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            body_text: post.body_text,
            content_json: post.content_json,
            content_html: post.content_html,
            slug: post.slug,
            excerpt: post.excerpt,
            reading_time: post.reading_time,
            cover_image: post.cover_image,
            is_featured: post.is_featured,
            grid_size: post.grid_size,
            status: post.status.to_status(),
            reference_snapshots: post.reference_snapshots.0,
            created_at: post.created_at,
            updated_at: post.updated_at,
            published_at: post.published_at,
            deleted_at: post.deleted_at,
        }
    }

    /// Maybe create a post from the `SQLx` version
    pub fn from_sqlx_post_optional(post: Option<SqlxPost>) -> Option<Self> {
        post.map(Self::from_sqlx_post)
    }

    /// Create multiple posts from the `SQLx` version
    pub fn from_sqlx_post_multiple(mut posts: Vec<SqlxPost>) -> Vec<Self> {
        posts
            .drain(..)
            .map(Self::from_sqlx_post)
            .collect::<Vec<Self>>()
    }
}

/// One day bucket of the month summary
#[derive(Debug, sqlx::FromRow)]
pub struct DaySummary {
    /// The day key
    pub day_key: NaiveDate,

    /// Number of non-deleted entries on that day
    pub count: i64,
}
