use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::tests::helper;

#[sqlx::test]
async fn test_draft_flow(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    // a bare draft gets the placeholder title
    let (status_code, body) = helper::create_post(&mut app, &user.access_token, json!({})).await;
    assert_eq!(StatusCode::CREATED, status_code);

    let post = &body["data"];
    assert_eq!("Untitled", post["title"].as_str().unwrap());
    assert_eq!("draft", post["status"].as_str().unwrap());
    assert!(post["slug"].is_null());
    assert!(post["publishedAt"].is_null());

    let post_id = post["id"].as_str().unwrap().to_string();

    // saving fills in content, untouched fields stay as they are
    let (status_code, body) = helper::save_post(
        &mut app,
        &user.access_token,
        &post_id,
        json!({
            "title": "On quiet mornings",
            "bodyText": "It starts before sunrise.",
            "contentJson": { "type": "doc", "content": [] },
        }),
    )
    .await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("On quiet mornings", body["data"]["title"].as_str().unwrap());

    let (status_code, body) = helper::save_post(
        &mut app,
        &user.access_token,
        &post_id,
        json!({ "isFeatured": true }),
    )
    .await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("On quiet mornings", body["data"]["title"].as_str().unwrap());
    assert!(body["data"]["isFeatured"].as_bool().unwrap());

    // drafts may be incomplete, saving an empty title is fine
    let (status_code, _) = helper::save_post(
        &mut app,
        &user.access_token,
        &post_id,
        json!({ "title": "" }),
    )
    .await;
    assert_eq!(StatusCode::OK, status_code);

    // visible through the single fetch
    let (status_code, body) = helper::get_post(&mut app, &user.access_token, &post_id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("", body["data"]["title"].as_str().unwrap());
}

#[sqlx::test]
async fn test_list_with_status_filter(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let (_, body) = helper::create_post(
        &mut app,
        &user.access_token,
        json!({ "title": "Stays a draft", "bodyText": "body" }),
    )
    .await;
    let draft_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = helper::create_post(
        &mut app,
        &user.access_token,
        json!({ "title": "Goes live", "bodyText": "body" }),
    )
    .await;
    let published_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status_code, _) = helper::publish_post(&mut app, &user.access_token, &published_id).await;
    assert_eq!(StatusCode::OK, status_code);

    let (_, body) = helper::request(
        &mut app,
        axum::http::Method::GET,
        "/api/posts",
        Some(&user.access_token),
        None,
    )
    .await;
    assert_eq!(2, body["data"].as_array().unwrap().len());

    let (_, body) = helper::request(
        &mut app,
        axum::http::Method::GET,
        "/api/posts?status=draft",
        Some(&user.access_token),
        None,
    )
    .await;
    let drafts = body["data"].as_array().unwrap();
    assert_eq!(1, drafts.len());
    assert_eq!(draft_id, drafts[0]["id"].as_str().unwrap());

    let (_, body) = helper::request(
        &mut app,
        axum::http::Method::GET,
        "/api/posts?status=published",
        Some(&user.access_token),
        None,
    )
    .await;
    let published = body["data"].as_array().unwrap();
    assert_eq!(1, published.len());
    assert_eq!(published_id, published[0]["id"].as_str().unwrap());
}

#[sqlx::test]
async fn test_post_ownership_and_existence(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let jane = helper::register(&mut app, "jane@example.com").await;
    let john = helper::register(&mut app, "john@example.com").await;

    let (_, body) = helper::create_post(
        &mut app,
        &jane.access_token,
        json!({ "title": "Janes post" }),
    )
    .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    // foreign posts are forbidden, not hidden
    let (status_code, _) = helper::get_post(&mut app, &john.access_token, &post_id).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);

    let (status_code, _) = helper::delete_post(&mut app, &john.access_token, &post_id).await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);

    // unknown posts are not found
    let unknown_id = Uuid::new_v4().to_string();
    let (status_code, _) = helper::get_post(&mut app, &jane.access_token, &unknown_id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    // a deleted post is invisible, even to its owner
    let (status_code, _) = helper::delete_post(&mut app, &jane.access_token, &post_id).await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    let (status_code, _) = helper::get_post(&mut app, &jane.access_token, &post_id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    let (status_code, _) = helper::delete_post(&mut app, &jane.access_token, &post_id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
}

#[sqlx::test]
async fn test_save_validates_cover_image(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let (_, body) = helper::create_post(&mut app, &user.access_token, json!({})).await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status_code, _) = helper::save_post(
        &mut app,
        &user.access_token,
        &post_id,
        json!({ "coverImage": "not a url" }),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);

    let (status_code, body) = helper::save_post(
        &mut app,
        &user.access_token,
        &post_id,
        json!({ "coverImage": "https://www.example.com/cover.png" }),
    )
    .await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(
        "https://www.example.com/cover.png",
        body["data"]["coverImage"].as_str().unwrap()
    );
}
