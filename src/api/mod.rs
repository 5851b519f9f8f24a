//! All API endpoint setup

use axum::Router;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::routing::put;

pub use cache::PublicCache;
pub use current_user::CurrentUser;
pub use current_user::JwtKeys;
pub use request::Form;
pub use request::PathParameters;
pub use request::QueryParameters;
pub use request::parse_url;
pub use response::Error;
pub use response::Success;

mod cache;
mod current_user;
mod entries;
mod posts;
mod public;
mod request;
mod response;
mod session;
mod users;

/// Get the Axum router for all API routes
pub fn router() -> Router {
    let session = Router::new()
        .route("/register", post(session::register))
        .route("/token", post(session::token))
        .route("/refresh", post(session::refresh))
        .route("/", delete(session::logout));

    let users = Router::new()
        .route("/me", get(users::me))
        .route("/me", patch(users::update_me))
        .route("/me/handle", post(users::ensure_handle));

    let entries = Router::new()
        .route("/", post(entries::create))
        .route("/today", get(entries::today))
        .route("/by-day", get(entries::by_day))
        .route("/month-summary", get(entries::month_summary))
        .route("/{entry}", put(entries::reject_update))
        .route("/{entry}", patch(entries::reject_update))
        .route("/{entry}", delete(entries::delete))
        .route("/{entry}/restore", post(entries::restore));

    let posts = Router::new()
        .route("/", post(posts::create))
        .route("/", get(posts::list))
        .route("/{post}", get(posts::single))
        .route("/{post}", patch(posts::update))
        .route("/{post}", delete(posts::delete))
        .route("/{post}/publish", post(posts::publish));

    let public = Router::new()
        .route("/{handle}", get(public::profile))
        .route("/{handle}/posts", get(public::posts))
        .route("/{handle}/posts/{slug}", get(public::post));

    Router::new()
        .nest("/session", session)
        .nest("/users", users)
        .nest("/entries", entries)
        .nest("/posts", posts)
        .nest("/public", public)
}
