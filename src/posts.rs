//! Outer posts
//!
//! Long-form articles with a draft/published lifecycle. Posts embed
//! reference snapshots: frozen copies of cited inner entries, taken at
//! citation time and never dereferenced again.

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Title given to posts that have not been titled yet
///
/// A post can not be published while it still carries this placeholder.
pub const PLACEHOLDER_TITLE: &str = "Untitled";

/// Maximum number of reference snapshots per post
pub const MAX_REFERENCES: usize = 10;

/// Post lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostStatus {
    /// Work in progress, only visible to its owner
    Draft,
    /// Live on the public profile
    Published,
}

/// A frozen copy of a cited inner entry
///
/// Denormalized on purpose: the post stays self-contained even when the
/// source entry is soft-deleted later.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSnapshot {
    /// ID of the entry this snapshot was taken from
    pub entry_id: Uuid,

    /// The entry text at citation time
    pub body_text: String,

    /// The entry's original creation instant
    pub created_at: NaiveDateTime,

    /// When the citation was made
    pub cited_at: NaiveDateTime,
}

/// A single outer post
#[derive(Clone, Debug)]
pub struct Post {
    /// Post ID
    pub id: Uuid,

    /// The ID of the owning user
    pub user_id: Uuid,

    /// Post title
    pub title: String,

    /// Plain text body, the source for excerpt/reading time derivation
    pub body_text: String,

    /// Structured editor document
    pub content_json: Option<serde_json::Value>,

    /// Rendered HTML body
    pub content_html: Option<String>,

    /// URL slug, unique within the owner's posts once set
    pub slug: Option<String>,

    /// Short summary shown on list pages
    pub excerpt: Option<String>,

    /// Estimated reading time in minutes
    pub reading_time: Option<i32>,

    /// Cover image URL
    pub cover_image: Option<String>,

    /// Featured on the public profile grid
    pub is_featured: bool,

    /// Grid layout hint for the public profile
    pub grid_size: Option<String>,

    /// Lifecycle status
    pub status: PostStatus,

    /// Embedded reference snapshots, at most [`MAX_REFERENCES`]
    pub reference_snapshots: Vec<ReferenceSnapshot>,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// First publish instant, kept across republishes
    pub published_at: Option<NaiveDateTime>,

    /// Soft-deleted at
    pub deleted_at: Option<NaiveDateTime>,
}

impl Post {
    /// Is the post soft-deleted?
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Is the post published?
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// Check the snapshot count cap
///
/// Enforced wherever snapshots are persisted, independent of any limit the
/// interface applies.
pub fn validate_reference_count(count: usize) -> Result<(), &'static str> {
    if count > MAX_REFERENCES {
        Err("Maximum 10 references allowed")
    } else {
        Ok(())
    }
}

/// What publishing a post requires from its content
///
/// The title must be real (non-empty, not the placeholder) and the body
/// must have substance after trimming. The error names the missing field.
pub fn validate_for_publish(post: &Post) -> Result<(), &'static str> {
    if post.title.trim().is_empty() || post.title == PLACEHOLDER_TITLE {
        return Err("Title is required for publishing");
    }

    if post.body_text.trim().is_empty() {
        return Err("Content is required for publishing");
    }

    Ok(())
}
