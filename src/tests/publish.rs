use axum::http::StatusCode;
use serde_json::json;

use crate::tests::helper;

#[sqlx::test]
async fn test_publish_preconditions(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let (_, body) = helper::create_post(&mut app, &user.access_token, json!({})).await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    // the placeholder title does not count as a title
    let (status_code, body) = helper::publish_post(&mut app, &user.access_token, &post_id).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        "Title is required for publishing",
        helper::error_message(&body)
    );

    helper::save_post(
        &mut app,
        &user.access_token,
        &post_id,
        json!({ "title": "A real title" }),
    )
    .await;

    let (status_code, body) = helper::publish_post(&mut app, &user.access_token, &post_id).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        "Content is required for publishing",
        helper::error_message(&body)
    );

    // nothing of the failed attempts stuck
    let (_, body) = helper::get_post(&mut app, &user.access_token, &post_id).await;
    assert_eq!("draft", body["data"]["status"].as_str().unwrap());
    assert!(body["data"]["slug"].is_null());
    assert!(body["data"]["excerpt"].is_null());
}

#[sqlx::test]
async fn test_publish_derivations(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let body_text = vec!["word"; 400].join(" ");

    let (_, body) = helper::create_post(
        &mut app,
        &user.access_token,
        json!({ "title": "Hello, World! 2024", "bodyText": body_text }),
    )
    .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status_code, body) = helper::publish_post(&mut app, &user.access_token, &post_id).await;
    assert_eq!(StatusCode::OK, status_code);

    let post = &body["data"];
    assert_eq!("published", post["status"].as_str().unwrap());
    assert_eq!("hello-world-2024", post["slug"].as_str().unwrap());
    assert!(post["publishedAt"].is_string());

    // 400 words at 200 words per minute
    assert_eq!(2, post["readingTime"].as_i64().unwrap());

    // derived excerpt: capped, cut on a word boundary, with an ellipsis
    let excerpt = post["excerpt"].as_str().unwrap();
    assert!(excerpt.ends_with("..."));
    assert!(excerpt.chars().count() <= 163);
    assert!(excerpt.trim_end_matches("...").ends_with("word"));
}

#[sqlx::test]
async fn test_publish_reading_time_floor(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let (_, body) = helper::create_post(
        &mut app,
        &user.access_token,
        json!({ "title": "Terse", "bodyText": "word" }),
    )
    .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = helper::publish_post(&mut app, &user.access_token, &post_id).await;
    assert_eq!(1, body["data"]["readingTime"].as_i64().unwrap());
}

#[sqlx::test]
async fn test_publish_slug_collisions_within_owner(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let mut slugs = Vec::new();

    for _ in 0..3 {
        let (_, body) = helper::create_post(
            &mut app,
            &user.access_token,
            json!({ "title": "Hello, World! 2024", "bodyText": "body" }),
        )
        .await;
        let post_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status_code, body) =
            helper::publish_post(&mut app, &user.access_token, &post_id).await;
        assert_eq!(StatusCode::OK, status_code);

        slugs.push(body["data"]["slug"].as_str().unwrap().to_string());
    }

    assert_eq!(
        vec![
            "hello-world-2024".to_string(),
            "hello-world-2024-2".to_string(),
            "hello-world-2024-3".to_string(),
        ],
        slugs
    );
}

#[sqlx::test]
async fn test_slugs_are_only_unique_per_author(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let jane = helper::register(&mut app, "jane@example.com").await;
    let john = helper::register(&mut app, "john@example.com").await;

    for user in [&jane, &john] {
        let (_, body) = helper::create_post(
            &mut app,
            &user.access_token,
            json!({ "title": "Same Title", "bodyText": "body" }),
        )
        .await;
        let post_id = body["data"]["id"].as_str().unwrap().to_string();

        let (_, body) = helper::publish_post(&mut app, &user.access_token, &post_id).await;

        // both authors get the plain slug, no cross-author suffixing
        assert_eq!("same-title", body["data"]["slug"].as_str().unwrap());
    }
}

#[sqlx::test]
async fn test_publish_symbol_title_falls_back(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let (_, body) = helper::create_post(
        &mut app,
        &user.access_token,
        json!({ "title": "?!?!", "bodyText": "body" }),
    )
    .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status_code, body) = helper::publish_post(&mut app, &user.access_token, &post_id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("untitled", body["data"]["slug"].as_str().unwrap());
}

#[sqlx::test]
async fn test_republish_keeps_first_publish_facts(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let (_, body) = helper::create_post(
        &mut app,
        &user.access_token,
        json!({ "title": "Evolving", "bodyText": "The first version." }),
    )
    .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = helper::publish_post(&mut app, &user.access_token, &post_id).await;
    let first = body["data"].clone();

    let published_at = first["publishedAt"].as_str().unwrap().to_string();
    let slug = first["slug"].as_str().unwrap().to_string();
    let excerpt = first["excerpt"].as_str().unwrap().to_string();

    // edit and publish again
    helper::save_post(
        &mut app,
        &user.access_token,
        &post_id,
        json!({ "bodyText": "The second version, considerably longer than before." }),
    )
    .await;

    let (status_code, body) = helper::publish_post(&mut app, &user.access_token, &post_id).await;
    assert_eq!(StatusCode::OK, status_code);

    let second = &body["data"];

    // the original publish instant, slug and stored excerpt survive
    assert_eq!(published_at, second["publishedAt"].as_str().unwrap());
    assert_eq!(slug, second["slug"].as_str().unwrap());
    assert_eq!(excerpt, second["excerpt"].as_str().unwrap());

    // but the edit itself moved the update stamp
    assert_ne!(
        first["updatedAt"].as_str().unwrap(),
        second["updatedAt"].as_str().unwrap()
    );
}

#[sqlx::test]
async fn test_publish_keeps_preset_excerpt(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let (_, body) = helper::create_post(
        &mut app,
        &user.access_token,
        json!({ "title": "Handwritten", "bodyText": "A very long body that would derive differently." }),
    )
    .await;
    let post_id = body["data"]["id"].as_str().unwrap().to_string();

    helper::save_post(
        &mut app,
        &user.access_token,
        &post_id,
        json!({ "excerpt": "My own words." }),
    )
    .await;

    let (_, body) = helper::publish_post(&mut app, &user.access_token, &post_id).await;

    // byte-identical, not regenerated
    assert_eq!("My own words.", body["data"]["excerpt"].as_str().unwrap());
}
