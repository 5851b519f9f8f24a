//! All things related to the storage of users, entries and posts

use core::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use uuid::Uuid;

pub use Config as DatabaseConfig;
pub use form_types::*;
pub use types::DaySummary;

use crate::entries::Entry;
use crate::posts::Post;
use crate::posts::PostStatus;
use crate::users::User;
use types::MIGRATOR;
use types::PostStatusType;
use types::SqlxEntry;
use types::SqlxPost;
use types::SqlxUser;
use types::ViewPreferenceType;

mod form_types;
mod types;

/// Storage errors
#[derive(Debug)]
pub enum Error {
    /// A connection error with the storage
    Connection(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Connection(error) => write!(f, "Connection error: {error}"),
        }
    }
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Database configuration
pub enum Config {
    /// Detect configuration from environment
    DetectConfig,

    /// Use existing connection
    ExistingConnection(PgPool),
}

/// Postgres storage
#[derive(Clone)]
pub struct Database {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Database {
    /// Create a new Postgres storage
    pub async fn from_config(config: Config) -> Self {
        match config {
            Config::DetectConfig => Self::new().await,
            Config::ExistingConnection(pool) => Self::new_with_pool(pool).await,
        }
    }

    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    async fn new() -> Self {
        let database_connection_string = std::env::var("DATABASE_URL").expect("Valid DATABASE_URL");

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .expect("Valid connection");

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    async fn new_with_pool(connection_pool: PgPool) -> Self {
        let migration_result = MIGRATOR.run(&connection_pool).await;

        if let Err(err) = migration_result {
            panic!("Migrations could not run: {err}");
        }

        Self { connection_pool }
    }
}

impl Database {
    /// Finds a single user by its ID
    ///
    /// Respects the soft-delete
    pub async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE deleted_at IS NULL
                AND id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Finds a single user by its email address
    ///
    /// Respects the soft-delete
    pub async fn find_single_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE deleted_at IS NULL
                AND email = $1
            LIMIT 1
            ",
        )
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Finds a single user by its public handle
    ///
    /// Respects the soft-delete
    pub async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            SELECT *
            FROM users
            WHERE deleted_at IS NULL
                AND username = $1
            LIMIT 1
            ",
        )
        .bind(username)
        .fetch_optional(&self.connection_pool)
        .await
        .map(User::from_sqlx_user_optional)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Create a single user
    pub async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            INSERT INTO users (id, email, hashed_password)
            VALUES ($1, $2, $3)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.email)
        .bind(values.hashed_password)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Update a user's profile settings
    pub async fn update_user(&self, user: &User, values: &UpdateUserValues) -> Result<User> {
        let view_preference = values.view_preference.unwrap_or(user.view_preference);

        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            UPDATE users
            SET view_preference = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *
            ",
        )
        .bind(ViewPreferenceType::from_view_preference(view_preference))
        .bind(user.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Allocate the public handle of a user
    ///
    /// The handle is permanent; this is only called for users without one.
    pub async fn set_username(&self, user: &User, username: &str) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(
            r"
            UPDATE users
            SET username = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND username IS NULL
            RETURNING *
            ",
        )
        .bind(username)
        .bind(user.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from_sqlx_user)
        .map_err(connection_error)?;

        Ok(user)
    }

    /// Create an entry
    pub async fn create_entry(&self, values: &CreateEntryValues<'_>) -> Result<Entry> {
        let entry = sqlx::query_as::<_, SqlxEntry>(
            r"
            INSERT INTO entries (id, user_id, body_text, day_key, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.user.id)
        .bind(values.body_text)
        .bind(values.day_key)
        .bind(values.created_at)
        .fetch_one(&self.connection_pool)
        .await
        .map(Entry::from_sqlx_entry)
        .map_err(connection_error)?;

        Ok(entry)
    }

    /// Find all entries of a user on a given day, newest first
    ///
    /// Respects the soft-delete
    pub async fn find_entries_by_day(&self, user: &User, day: NaiveDate) -> Result<Vec<Entry>> {
        let entries = sqlx::query_as::<_, SqlxEntry>(
            r"
            SELECT *
            FROM entries
            WHERE deleted_at IS NULL AND user_id = $1 AND day_key = $2
            ORDER BY created_at DESC
            ",
        )
        .bind(user.id)
        .bind(day)
        .fetch_all(&self.connection_pool)
        .await
        .map(Entry::from_sqlx_entry_multiple)
        .map_err(connection_error)?;

        Ok(entries)
    }

    /// Count non-deleted entries per day over an inclusive day range
    pub async fn month_summary(
        &self,
        user: &User,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DaySummary>> {
        let summary = sqlx::query_as::<_, DaySummary>(
            r"
            SELECT day_key, COUNT(*) AS count
            FROM entries
            WHERE deleted_at IS NULL AND user_id = $1 AND day_key BETWEEN $2 AND $3
            GROUP BY day_key
            ORDER BY day_key
            ",
        )
        .bind(user.id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(summary)
    }

    /// Find a single entry by ID (unchecked)
    ///
    /// DOES NOT respect the soft-delete, handle with care
    pub async fn find_single_entry_by_id_unchecked(&self, id: &Uuid) -> Result<Option<Entry>> {
        let entry = sqlx::query_as::<_, SqlxEntry>(
            r"
            SELECT *
            FROM entries
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Entry::from_sqlx_entry_optional)
        .map_err(connection_error)?;

        Ok(entry)
    }

    /// Soft-delete an entry
    ///
    /// Guarded: returns `false` when the entry was already deleted by the
    /// time the statement ran, so a raced double-delete can not succeed
    /// twice.
    pub async fn soft_delete_entry(&self, entry: &Entry) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE entries
            SET deleted_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(entry.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Restore a soft-deleted entry
    ///
    /// Guarded the same way as [`soft_delete_entry`](Self::soft_delete_entry)
    pub async fn restore_entry(&self, entry: &Entry) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE entries
            SET deleted_at = NULL
            WHERE id = $1 AND deleted_at IS NOT NULL
            ",
        )
        .bind(entry.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Create a post draft
    pub async fn create_post(&self, values: &CreatePostValues<'_>) -> Result<Post> {
        let post = sqlx::query_as::<_, SqlxPost>(
            r"
            INSERT INTO posts (id, user_id, title, body_text, content_json, reference_snapshots)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.user.id)
        .bind(values.title)
        .bind(values.body_text)
        .bind(values.content_json.cloned())
        .bind(Json(values.reference_snapshots))
        .fetch_one(&self.connection_pool)
        .await
        .map(Post::from_sqlx_post)
        .map_err(connection_error)?;

        Ok(post)
    }

    /// Find all posts of a user, optionally filtered by status, newest first
    ///
    /// Respects the soft-delete
    pub async fn find_all_posts_by_owner(
        &self,
        user: &User,
        status: Option<PostStatus>,
    ) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, SqlxPost>(
            r"
            SELECT *
            FROM posts
            WHERE deleted_at IS NULL
                AND user_id = $1
                AND ($2::post_status_type IS NULL OR status = $2)
            ORDER BY created_at DESC
            ",
        )
        .bind(user.id)
        .bind(status.map(PostStatusType::from_status))
        .fetch_all(&self.connection_pool)
        .await
        .map(Post::from_sqlx_post_multiple)
        .map_err(connection_error)?;

        Ok(posts)
    }

    /// Find a single post by ID (unchecked)
    ///
    /// DOES NOT respect the soft-delete, handle with care
    pub async fn find_single_post_by_id_unchecked(&self, id: &Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, SqlxPost>(
            r"
            SELECT *
            FROM posts
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Post::from_sqlx_post_optional)
        .map_err(connection_error)?;

        Ok(post)
    }

    /// Save a post draft
    ///
    /// Only provided values are processed, the other fields of the post
    /// will not be touched
    pub async fn update_post(&self, post: &Post, values: &SavePostValues<'_>) -> Result<Post> {
        let updated_post = sqlx::query_as::<_, SqlxPost>(
            r"
            UPDATE posts
            SET title = $1,
                body_text = $2,
                content_json = $3,
                content_html = $4,
                excerpt = $5,
                cover_image = $6,
                is_featured = $7,
                grid_size = $8,
                reference_snapshots = $9,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $10
            RETURNING *
            ",
        )
        .bind(values.title.unwrap_or(&post.title))
        .bind(values.body_text.unwrap_or(&post.body_text))
        .bind(values.content_json.or(post.content_json.as_ref()).cloned())
        .bind(values.content_html.or(post.content_html.as_deref()))
        .bind(values.excerpt.or(post.excerpt.as_deref()))
        .bind(values.cover_image.or(post.cover_image.as_deref()))
        .bind(values.is_featured.unwrap_or(post.is_featured))
        .bind(values.grid_size.or(post.grid_size.as_deref()))
        .bind(Json(
            values
                .reference_snapshots
                .unwrap_or(post.reference_snapshots.as_slice()),
        ))
        .bind(post.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(Post::from_sqlx_post)
        .map_err(connection_error)?;

        Ok(updated_post)
    }

    /// Publish a post
    ///
    /// One statement persists the whole derivation; the original publish
    /// instant survives republishing.
    pub async fn publish_post(&self, post: &Post, values: &PublishPostValues<'_>) -> Result<Post> {
        let published_post = sqlx::query_as::<_, SqlxPost>(
            r"
            UPDATE posts
            SET status = 'published',
                slug = $1,
                excerpt = $2,
                reading_time = $3,
                published_at = COALESCE(published_at, $4),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5
            RETURNING *
            ",
        )
        .bind(values.slug)
        .bind(values.excerpt)
        .bind(values.reading_time)
        .bind(values.published_at)
        .bind(post.id)
        .fetch_one(&self.connection_pool)
        .await
        .map(Post::from_sqlx_post)
        .map_err(connection_error)?;

        Ok(published_post)
    }

    /// Soft-delete a post
    pub async fn soft_delete_post(&self, post: &Post) -> Result<bool> {
        let result = sqlx::query(
            r"
            UPDATE posts
            SET deleted_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(post.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// All slugs already taken by a user's posts, excluding one post
    ///
    /// Includes soft-deleted posts; a deleted post keeps its slug reserved.
    pub async fn find_taken_slugs(&self, user: &User, exclude: &Uuid) -> Result<Vec<String>> {
        let slugs = sqlx::query_scalar::<_, String>(
            r"
            SELECT slug
            FROM posts
            WHERE user_id = $1 AND slug IS NOT NULL AND id <> $2
            ",
        )
        .bind(user.id)
        .bind(exclude)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(slugs)
    }

    /// One page of a user's published posts, newest publish first
    ///
    /// Respects the soft-delete
    pub async fn find_published_posts_page(
        &self,
        user: &User,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, SqlxPost>(
            r"
            SELECT *
            FROM posts
            WHERE deleted_at IS NULL
                AND user_id = $1
                AND status = 'published'
            ORDER BY published_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user.id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.connection_pool)
        .await
        .map(Post::from_sqlx_post_multiple)
        .map_err(connection_error)?;

        Ok(posts)
    }

    /// Count a user's published posts
    pub async fn count_published_posts(&self, user: &User) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*)
            FROM posts
            WHERE deleted_at IS NULL
                AND user_id = $1
                AND status = 'published'
            ",
        )
        .bind(user.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(count)
    }

    /// Find a user's published post by slug
    ///
    /// Respects the soft-delete
    pub async fn find_published_post_by_slug(
        &self,
        user: &User,
        slug: &str,
    ) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, SqlxPost>(
            r"
            SELECT *
            FROM posts
            WHERE deleted_at IS NULL
                AND user_id = $1
                AND status = 'published'
                AND slug = $2
            LIMIT 1
            ",
        )
        .bind(user.id)
        .bind(slug)
        .fetch_optional(&self.connection_pool)
        .await
        .map(Post::from_sqlx_post_optional)
        .map_err(connection_error)?;

        Ok(post)
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
