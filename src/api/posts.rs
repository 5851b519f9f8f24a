//! Outer post endpoints
//!
//! Drafting, autosave, the publish transition and deletion. Publishing
//! derives slug/excerpt/reading time up front and persists the lot in one
//! statement; nothing is stored when any precondition fails.

use std::collections::HashSet;

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::clock::Stamp;
use crate::database::CreatePostValues;
use crate::database::Database;
use crate::database::PublishPostValues;
use crate::database::SavePostValues;
use crate::posts::PLACEHOLDER_TITLE;
use crate::posts::Post;
use crate::posts::PostStatus;
use crate::posts::ReferenceSnapshot;
use crate::posts::validate_for_publish;
use crate::posts::validate_reference_count;
use crate::slug::FALLBACK_SLUG;
use crate::slug::make_slug_unique;
use crate::slug::reading_time;
use crate::slug::slugify;
use crate::users::User;

use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::PublicCache;
use super::QueryParameters;
use super::Success;
use super::parse_url;
use super::users::fetch_current_user;

/// Post response going to the owner
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    /// Post ID
    pub id: Uuid,

    /// Title
    pub title: String,

    /// Plain text body
    pub body_text: String,

    /// Structured editor document
    pub content_json: Option<serde_json::Value>,

    /// Rendered HTML body
    pub content_html: Option<String>,

    /// URL slug, set at first publish
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
    pub status: PostStatus,

    /// Embedded reference snapshots
    #[serde(rename = "references")]
    pub reference_snapshots: Vec<ReferenceSnapshot>,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last updated at
    pub updated_at: NaiveDateTime,

    /// First publish instant
    pub published_at: Option<NaiveDateTime>,
}

impl PostResponse {
    fn from_post(post: Post) -> Self {
        Self {
            id: post.id,
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
            status: post.status,
            reference_snapshots: post.reference_snapshots,
            created_at: post.created_at,
            updated_at: post.updated_at,
            published_at: post.published_at,
        }
    }

    fn from_post_multiple(mut posts: Vec<Post>) -> Vec<Self> {
        posts.drain(..).map(Self::from_post).collect::<Vec<Self>>()
    }
}

/// A citation in a create/save form
///
/// Only the entry ID: the snapshot body and both instants are taken
/// server-side, a client can not smuggle in its own timestamps or text.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationForm {
    /// The cited entry
    entry_id: Uuid,
}

/// Create post form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostForm {
    /// Initial title
    title: Option<String>,

    /// Initial body text
    body_text: Option<String>,

    /// Initial structured document
    content_json: Option<serde_json::Value>,

    /// Initial citations
    references: Option<Vec<CitationForm>>,
}

/// Create a post draft
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "On quiet mornings" }' \
///     http://localhost:6000/api/posts
/// ```
pub async fn create(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<CreatePostForm>,
) -> Result<Success<PostResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;

    let stamp = Stamp::now();

    let citations = form.references.unwrap_or_default();
    let snapshots = resolve_snapshots(&database, &user, &[], &citations, &stamp).await?;

    let title = form
        .title
        .as_deref()
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(PLACEHOLDER_TITLE);

    let values = CreatePostValues {
        user: &user,
        title,
        body_text: form.body_text.as_deref().unwrap_or(""),
        content_json: form.content_json.as_ref(),
        reference_snapshots: &snapshots,
    };

    let post = database
        .create_post(&values)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::created(PostResponse::from_post(post)))
}

/// List posts query
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    /// Only posts with this status; all when absent
    status: Option<PostStatus>,
}

/// List the caller's posts, drafts included, newest first
pub async fn list(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    QueryParameters(query): QueryParameters<ListPostsQuery>,
) -> Result<Success<Vec<PostResponse>>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;

    let posts = database
        .find_all_posts_by_owner(&user, query.status)
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(PostResponse::from_post_multiple(posts)))
}

/// Get a single post of the caller
pub async fn single(
    Extension(database): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(post_id): PathParameters<Uuid>,
) -> Result<Success<PostResponse>, Error> {
    let post = fetch_owned_post(&database, &current_user, &post_id).await?;

    Ok(Success::ok(PostResponse::from_post(post)))
}

/// Save post form
///
/// All fields are optional and are not touched when not provided; drafts
/// may be incomplete.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePostForm {
    /// New title
    title: Option<String>,

    /// New body text
    body_text: Option<String>,

    /// New structured document
    content_json: Option<serde_json::Value>,

    /// New rendered HTML
    content_html: Option<String>,

    /// New excerpt
    excerpt: Option<String>,

    /// New cover image URL
    cover_image: Option<String>,

    /// New featured flag
    is_featured: Option<bool>,

    /// New grid layout hint
    grid_size: Option<String>,

    /// New citation set; snapshots of dropped citations are discarded
    references: Option<Vec<CitationForm>>,
}

/// Save a post (autosave and manual save alike)
///
/// Request:
/// ```sh
/// curl -v -XPATCH -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "bodyText": "It starts before sunrise." }' \
///     http://localhost:6000/api/posts/<uuid>
/// ```
pub async fn update(
    Extension(database): Extension<Database>,
    Extension(page_cache): Extension<PublicCache>,
    current_user: CurrentUser,
    PathParameters(post_id): PathParameters<Uuid>,
    Form(form): Form<SavePostForm>,
) -> Result<Success<PostResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;
    let post = fetch_owned_post(&database, &current_user, &post_id).await?;

    if let Some(ref cover_image) = form.cover_image {
        parse_url(cover_image)?;
    }

    let stamp = Stamp::now();

    let snapshots = match form.references {
        Some(ref citations) => Some(
            resolve_snapshots(
                &database,
                &user,
                &post.reference_snapshots,
                citations,
                &stamp,
            )
            .await?,
        ),
        None => None,
    };

    let values = SavePostValues {
        title: form.title.as_deref(),
        body_text: form.body_text.as_deref(),
        content_json: form.content_json.as_ref(),
        content_html: form.content_html.as_deref(),
        excerpt: form.excerpt.as_deref(),
        cover_image: form.cover_image.as_deref(),
        is_featured: form.is_featured,
        grid_size: form.grid_size.as_deref(),
        reference_snapshots: snapshots.as_deref(),
    };

    let updated_post = database
        .update_post(&post, &values)
        .await
        .map_err(Error::internal_server_error)?;

    // saving a live post changes what the public sees
    if post.is_published() {
        invalidate_public_pages(&page_cache, &user, post.slug.as_deref()).await;
    }

    Ok(Success::ok(PostResponse::from_post(updated_post)))
}

/// Publish a post
///
/// Derives what is missing (slug, excerpt, reading time), resolves slug
/// uniqueness within the owner's posts and flips the status. Republishing
/// refreshes content-derived fields but keeps the original publish
/// instant, slug and a preset excerpt untouched.
///
/// Request:
/// ```sh
/// curl -v -XPOST -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/posts/<uuid>/publish
/// ```
pub async fn publish(
    Extension(database): Extension<Database>,
    Extension(page_cache): Extension<PublicCache>,
    current_user: CurrentUser,
    PathParameters(post_id): PathParameters<Uuid>,
) -> Result<Success<PostResponse>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;
    let post = fetch_owned_post(&database, &current_user, &post_id).await?;

    validate_for_publish(&post).map_err(Error::bad_request)?;

    // everything is derived before anything is written
    let slug = match post.slug {
        Some(ref slug) => slug.clone(),
        None => {
            let base = slugify(&post.title);
            let base = if base.is_empty() {
                FALLBACK_SLUG.to_string()
            } else {
                base
            };

            let taken = database
                .find_taken_slugs(&user, &post.id)
                .await
                .map_err(Error::internal_server_error)?
                .into_iter()
                .collect::<HashSet<String>>();

            make_slug_unique(&base, &taken)
        }
    };

    let excerpt = match post.excerpt {
        Some(ref excerpt) => excerpt.clone(),
        None => crate::slug::excerpt(&post.body_text),
    };

    let reading_time = reading_time(&post.body_text);

    let stamp = Stamp::now();

    let values = PublishPostValues {
        slug: &slug,
        excerpt: &excerpt,
        reading_time,
        published_at: stamp.instant(),
    };

    tracing::debug!("Publishing post {} as /{slug}", post.id);

    let published_post = database
        .publish_post(&post, &values)
        .await
        .map_err(Error::internal_server_error)?;

    invalidate_public_pages(&page_cache, &user, Some(&slug)).await;

    Ok(Success::ok(PostResponse::from_post(published_post)))
}

/// Soft-delete a post
///
/// Request:
/// ```sh
/// curl -v -XDELETE -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/posts/<uuid>
/// ```
pub async fn delete(
    Extension(database): Extension<Database>,
    Extension(page_cache): Extension<PublicCache>,
    current_user: CurrentUser,
    PathParameters(post_id): PathParameters<Uuid>,
) -> Result<Success<&'static str>, Error> {
    let user = fetch_current_user(&database, &current_user).await?;
    let post = fetch_owned_post(&database, &current_user, &post_id).await?;

    let deleted = database
        .soft_delete_post(&post)
        .await
        .map_err(Error::internal_server_error)?;

    if !deleted {
        return Err(Error::not_found("Post not found"));
    }

    // a deleted live post must drop off the public profile right away
    if post.is_published() {
        invalidate_public_pages(&page_cache, &user, post.slug.as_deref()).await;
    }

    Ok(Success::<&'static str>::no_content())
}

/// Turn a citation list into the snapshot set to persist
///
/// The count cap is enforced here, at the persistence boundary, no matter
/// what the interface allowed. Citations already snapshotted on the post
/// keep their stored tuple untouched; new ones are copied from the live
/// entry with the citation instant stamped now.
async fn resolve_snapshots(
    database: &Database,
    user: &User,
    existing: &[ReferenceSnapshot],
    citations: &[CitationForm],
    stamp: &Stamp,
) -> Result<Vec<ReferenceSnapshot>, Error> {
    validate_reference_count(citations.len()).map_err(Error::bad_request)?;

    let mut snapshots: Vec<ReferenceSnapshot> = Vec::with_capacity(citations.len());

    for citation in citations {
        if snapshots
            .iter()
            .any(|snapshot| snapshot.entry_id == citation.entry_id)
        {
            continue;
        }

        if let Some(snapshot) = existing
            .iter()
            .find(|snapshot| snapshot.entry_id == citation.entry_id)
        {
            snapshots.push(snapshot.clone());
            continue;
        }

        let entry = database
            .find_single_entry_by_id_unchecked(&citation.entry_id)
            .await
            .map_err(Error::internal_server_error)?
            .map_or_else(|| Err(Error::bad_request("Cited entry not found")), Ok)?;

        if entry.user_id != user.id {
            return Err(Error::bad_request("Cited entry not found"));
        }

        if entry.is_deleted() {
            return Err(Error::bad_request("Cited entry is deleted"));
        }

        snapshots.push(ReferenceSnapshot {
            entry_id: entry.id,
            body_text: entry.body_text,
            created_at: entry.created_at,
            cited_at: stamp.instant(),
        });
    }

    Ok(snapshots)
}

/// Invalidate the author's public pages, when there is a public to speak of
async fn invalidate_public_pages(page_cache: &PublicCache, user: &User, slug: Option<&str>) {
    if let Some(username) = user.username.as_deref() {
        page_cache.invalidate_author(username, slug).await;
    }
}

/// Fetch a post and check it belongs to the caller
///
/// A deleted post is invisible here; a foreign one is explicitly
/// forbidden.
async fn fetch_owned_post(
    database: &Database,
    current_user: &CurrentUser,
    post_id: &Uuid,
) -> Result<Post, Error> {
    let post = database
        .find_single_post_by_id_unchecked(post_id)
        .await
        .map_err(Error::internal_server_error)?
        .map_or_else(|| Err(Error::not_found("Post not found")), Ok)?;

    if post.user_id != current_user.user_id {
        return Err(Error::forbidden("Not the owner of this post"));
    }

    if post.is_deleted() {
        return Err(Error::not_found("Post not found"));
    }

    Ok(post)
}
