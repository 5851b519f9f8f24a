use axum::http::StatusCode;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::tests::helper;

/// Seed an entry directly, bypassing the server clock
///
/// The API only ever writes entries on "today"; summaries over arbitrary
/// months need rows planted in the past.
async fn seed_entry(pool: &sqlx::PgPool, user_id: Uuid, day: NaiveDate, deleted: bool) {
    // 03:00 UTC is midday in the journal timezone, same calendar day
    let created_at = day.and_hms_opt(3, 0, 0).unwrap();

    sqlx::query(
        r"
        INSERT INTO entries (id, user_id, body_text, day_key, created_at, deleted_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind("seeded entry")
    .bind(day)
    .bind(created_at)
    .bind(if deleted { Some(created_at) } else { None })
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test]
async fn test_month_summary_buckets(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool.clone()).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    let first = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let tenth = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let last = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

    // five entries over three distinct days
    seed_entry(&pool, user.user_id, first, false).await;
    seed_entry(&pool, user.user_id, first, false).await;
    seed_entry(&pool, user.user_id, tenth, false).await;
    seed_entry(&pool, user.user_id, last, false).await;
    seed_entry(&pool, user.user_id, last, false).await;

    // noise: a deleted entry and entries of the neighbouring months
    seed_entry(&pool, user.user_id, tenth, true).await;
    seed_entry(&pool, user.user_id, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(), false).await;
    seed_entry(&pool, user.user_id, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(), false).await;

    let (status_code, body) = helper::month_summary(&mut app, &user.access_token, "2024-06").await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("2024-06", body["data"]["month"].as_str().unwrap());

    let summary = body["data"]["summary"].as_array().unwrap();
    assert_eq!(3, summary.len());

    let total: i64 = summary
        .iter()
        .map(|bucket| bucket["count"].as_i64().unwrap())
        .sum();
    assert_eq!(5, total);

    assert_eq!("2024-06-01", summary[0]["day"].as_str().unwrap());
    assert_eq!(2, summary[0]["count"].as_i64().unwrap());
    assert_eq!("2024-06-10", summary[1]["day"].as_str().unwrap());
    assert_eq!(1, summary[1]["count"].as_i64().unwrap());
    assert_eq!("2024-06-30", summary[2]["day"].as_str().unwrap());
    assert_eq!(2, summary[2]["count"].as_i64().unwrap());
}

#[sqlx::test]
async fn test_month_summary_is_per_user(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool.clone()).await;

    let jane = helper::register(&mut app, "jane@example.com").await;
    let john = helper::register(&mut app, "john@example.com").await;

    let day = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    seed_entry(&pool, jane.user_id, day, false).await;

    let (_, body) = helper::month_summary(&mut app, &john.access_token, "2024-06").await;
    assert_eq!(0, body["data"]["summary"].as_array().unwrap().len());
}

#[sqlx::test]
async fn test_month_summary_invalid_format(pool: sqlx::PgPool) {
    let mut app = helper::setup_test_app(pool).await;

    let user = helper::register(&mut app, "jane@example.com").await;

    for month in ["2024-6", "2024-13", "202406", "June"] {
        let (status_code, body) =
            helper::month_summary(&mut app, &user.access_token, month).await;
        assert_eq!(StatusCode::BAD_REQUEST, status_code, "month: {month}");
        assert_eq!(
            "Invalid month format, use YYYY-MM",
            helper::error_message(&body)
        );
    }
}
