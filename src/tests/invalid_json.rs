use axum::body::Body;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::Service;

use crate::tests::helper;

async fn raw_request(
    app: &mut axum::Router,
    access_token: &str,
    body: &'static str,
    include_content_type: bool,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(Method::POST).uri("/api/entries");

    if include_content_type {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    }

    let request = builder
        .header(AUTHORIZATION, access_token)
        .body(Body::from(body.as_bytes()))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status_code = response.status();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice::<Value>(&bytes[..]).unwrap();

    (status_code, body)
}

#[sqlx::test]
async fn test_invalid_json(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    // broken syntax
    let (status_code, body) =
        raw_request(&mut app, &user.access_token, r#"{ "text": "#, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("JSON syntax error", helper::error_message(&body));

    // valid JSON, wrong shape
    let (status_code, body) =
        raw_request(&mut app, &user.access_token, r#"{ "nope": true }"#, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Data error", helper::error_message(&body));

    // missing content type
    let (status_code, body) =
        raw_request(&mut app, &user.access_token, r#"{ "text": "hi" }"#, false).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        "Missing `application/json` content type",
        helper::error_message(&body)
    );
}
