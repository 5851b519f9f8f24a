//! Public read endpoints
//!
//! No authentication: everything here is what the world is meant to see.
//! Only published, non-deleted posts resolve; a deleted post's page is
//! gone even though its row is not. Profile and single-post payloads are
//! served through the page cache.

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::Database;
use crate::posts::Post;
use crate::posts::ReferenceSnapshot;
use crate::users::User;

use super::Error;
use super::PathParameters;
use super::PublicCache;
use super::QueryParameters;
use super::Success;

/// Default page size for the published post list
const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size for the published post list
const MAX_PAGE_SIZE: i64 = 50;

/// A public profile
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// The public handle
    username: String,

    /// Member since
    created_at: NaiveDateTime,
}

/// Resolve a handle to a profile
///
/// Request:
/// ```sh
/// curl -v http://localhost:6000/api/public/jane
/// ```
pub async fn profile(
    Extension(database): Extension<Database>,
    Extension(page_cache): Extension<PublicCache>,
    PathParameters(handle): PathParameters<String>,
) -> Result<Success<Value>, Error> {
    if let Some(payload) = page_cache.get_profile(&handle).await {
        return Ok(Success::ok(payload));
    }

    let user = fetch_public_user(&database, &handle).await?;

    let payload = serde_json::to_value(ProfileResponse {
        username: handle.clone(),
        created_at: user.created_at,
    })
    .map_err(Error::internal_server_error)?;

    page_cache.put_profile(&handle, payload.clone()).await;

    Ok(Success::ok(payload))
}

/// Page query
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based page number
    page: Option<i64>,

    /// Page size, capped at [`MAX_PAGE_SIZE`]
    limit: Option<i64>,
}

/// A published post, as shown on list pages
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPostListItem {
    /// Post ID
    id: Uuid,

    /// Title
    title: String,

    /// URL slug
    slug: Option<String>,

    /// Short summary
    excerpt: Option<String>,

    /// Cover image URL
    cover_image: Option<String>,

    /// Reading time in minutes
    reading_time: Option<i32>,

    /// Featured flag
    is_featured: bool,

    /// Grid layout hint
    grid_size: Option<String>,

    /// Publish instant
    published_at: Option<NaiveDateTime>,
}

impl PublicPostListItem {
    fn from_post(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            reading_time: post.reading_time,
            is_featured: post.is_featured,
            grid_size: post.grid_size,
            published_at: post.published_at,
        }
    }
}

/// Pagination information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The requested page
    page: i64,

    /// The applied page size
    limit: i64,

    /// Total number of published posts
    total: i64,

    /// Total number of pages
    total_pages: i64,

    /// Is there a page after this one?
    has_more: bool,
}

/// One page of published posts
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPostsResponse {
    /// The posts, newest publish first
    posts: Vec<PublicPostListItem>,

    /// Pagination information
    pagination: Pagination,
}

/// List a profile's published posts
///
/// Request:
/// ```sh
/// curl -v 'http://localhost:6000/api/public/jane/posts?page=2&limit=10'
/// ```
pub async fn posts(
    Extension(database): Extension<Database>,
    PathParameters(handle): PathParameters<String>,
    QueryParameters(query): QueryParameters<PageQuery>,
) -> Result<Success<PublicPostsResponse>, Error> {
    let user = fetch_public_user(&database, &handle).await?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1) * limit;

    let posts = database
        .find_published_posts_page(&user, limit, offset)
        .await
        .map_err(Error::internal_server_error)?;

    let total = database
        .count_published_posts(&user)
        .await
        .map_err(Error::internal_server_error)?;

    let has_more = offset + i64::try_from(posts.len()).unwrap_or(0) < total;

    Ok(Success::ok(PublicPostsResponse {
        posts: posts
            .into_iter()
            .map(PublicPostListItem::from_post)
            .collect(),
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
            has_more,
        },
    }))
}

/// A published post, in full
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPostResponse {
    /// Post ID
    id: Uuid,

    /// Title
    title: String,

    /// URL slug
    slug: Option<String>,

    /// Plain text body
    body_text: String,

    /// Structured editor document
    content_json: Option<serde_json::Value>,

    /// Rendered HTML body
    content_html: Option<String>,

    /// Short summary
    excerpt: Option<String>,

    /// Cover image URL
    cover_image: Option<String>,

    /// Reading time in minutes
    reading_time: Option<i32>,

    /// The embedded reference snapshots, exactly as captured
    ///
    /// Rendering never dereferences the source entries; a snapshot
    /// outlives its entry's deletion.
    references: Vec<ReferenceSnapshot>,

    /// Publish instant
    published_at: Option<NaiveDateTime>,

    /// Last updated at
    updated_at: NaiveDateTime,
}

/// A public post page: the post and its author
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPostPage {
    /// The post
    post: PublicPostResponse,

    /// The author
    author: PublicAuthor,
}

/// The author of a public post
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAuthor {
    /// The public handle
    username: String,
}

/// Fetch one published post by handle and slug
///
/// Request:
/// ```sh
/// curl -v http://localhost:6000/api/public/jane/posts/on-quiet-mornings
/// ```
pub async fn post(
    Extension(database): Extension<Database>,
    Extension(page_cache): Extension<PublicCache>,
    PathParameters((handle, slug)): PathParameters<(String, String)>,
) -> Result<Success<Value>, Error> {
    if let Some(payload) = page_cache.get_post(&handle, &slug).await {
        return Ok(Success::ok(payload));
    }

    tracing::debug!("Cache miss for post page /{handle}/{slug}");

    let user = fetch_public_user(&database, &handle).await?;

    let post = database
        .find_published_post_by_slug(&user, &slug)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("Post not found")), Ok)?;

    let payload = serde_json::to_value(PublicPostPage {
        post: PublicPostResponse {
            id: post.id,
            title: post.title,
            slug: post.slug,
            body_text: post.body_text,
            content_json: post.content_json,
            content_html: post.content_html,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            reading_time: post.reading_time,
            references: post.reference_snapshots,
            published_at: post.published_at,
            updated_at: post.updated_at,
        },
        author: PublicAuthor { username: handle.clone() },
    })
    .map_err(Error::internal_server_error)?;

    page_cache.put_post(&handle, &slug, payload.clone()).await;

    Ok(Success::ok(payload))
}

/// Resolve a handle to its user
async fn fetch_public_user(database: &Database, handle: &str) -> Result<User, Error> {
    database
        .find_single_user_by_username(handle)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("User not found")), Ok)
}
