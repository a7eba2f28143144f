mod support;
mod test_utils;

use reqwest::StatusCode;
use serde_json::{json, Value};
use sqlx::PgPool;
use test_utils::{AuthTestHelpers, TestApp};
use uuid::Uuid;

const JPEG_BYTES: &[u8] = b"not much of a jpeg";

async fn count(pool: &PgPool, sql: &str, id: &Uuid) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
}

#[actix_rt::test]
async fn deleting_an_album_detaches_its_photos() {
    let Some(app) = TestApp::spawn().await else { return };
    let (owner, token) = app.create_verified_user("marta").await;

    let files: [(&str, &[u8]); 3] = [("a.jpg", JPEG_BYTES), ("b.jpg", JPEG_BYTES), ("c.jpg", JPEG_BYTES)];
    let response = app.upload(&token, &files, Some("Summer")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let report: Value = response.json().await.unwrap();
    assert_eq!(report["succeeded"].as_array().map(Vec::len), Some(3));

    let in_album = count(
        &app.db_pool,
        "SELECT COUNT(*) FROM photos WHERE user_id = $1 AND album_id IS NOT NULL",
        &owner.id,
    )
    .await;
    assert_eq!(in_album, 3);

    let response = app.post_json("/delete_album", &token, &json!({ "title": "summer" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let detached = count(
        &app.db_pool,
        "SELECT COUNT(*) FROM photos WHERE user_id = $1 AND album_id IS NULL",
        &owner.id,
    )
    .await;
    assert_eq!(detached, 3);
    assert_eq!(count(&app.db_pool, "SELECT COUNT(*) FROM albums WHERE user_id = $1", &owner.id).await, 0);

    let page: Value = app.get("/", &token).await.json().await.unwrap();
    assert_eq!(page["items"].as_array().map(Vec::len), Some(3));
}

#[actix_rt::test]
async fn deleting_an_account_removes_everything_it_owns() {
    let Some(app) = TestApp::spawn().await else { return };
    let (owner, token) = app.create_verified_user("marta").await;
    let (friend, friend_token) = app.create_verified_user("oma").await;

    let response = app
        .post_json("/share", &token, &json!({ "username": friend.username, "alias": "Grandma" }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app
        .post_json("/share", &friend_token, &json!({ "username": owner.username }))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let files: [(&str, &[u8]); 1] = [("a.jpg", JPEG_BYTES)];
    assert_eq!(app.upload(&token, &files, Some("Summer")).await.status(), StatusCode::CREATED);
    assert_eq!(app.upload(&friend_token, &files, None).await.status(), StatusCode::CREATED);

    let photo_id: Uuid = sqlx::query_scalar("SELECT id FROM photos WHERE user_id = $1")
        .bind(owner.id)
        .fetch_one(&app.db_pool)
        .await
        .unwrap();

    let response = app
        .post_json("/delete_account", &token, &json!({ "password": support::PASSWORD }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let pool = &app.db_pool;
    assert_eq!(count(pool, "SELECT COUNT(*) FROM users WHERE id = $1", &owner.id).await, 0);
    assert_eq!(count(pool, "SELECT COUNT(*) FROM photos WHERE user_id = $1", &owner.id).await, 0);
    assert_eq!(count(pool, "SELECT COUNT(*) FROM albums WHERE user_id = $1", &owner.id).await, 0);
    assert_eq!(count(pool, "SELECT COUNT(*) FROM photo_comments WHERE photo_id = $1", &photo_id).await, 0);
    assert_eq!(
        count(
            pool,
            "SELECT COUNT(*) FROM shared_access WHERE owner_id = $1 OR shared_user_id = $1",
            &owner.id
        )
        .await,
        0
    );

    assert_eq!(count(pool, "SELECT COUNT(*) FROM users WHERE id = $1", &friend.id).await, 1);
    assert_eq!(count(pool, "SELECT COUNT(*) FROM photos WHERE user_id = $1", &friend.id).await, 1);
}
