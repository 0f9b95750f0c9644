//! HTTP-level integration tests for the admin endpoints.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get_auth, login, post_json, post_json_auth, seed_user,
};
use serde_json::json;
use spartan_db::models::post::CreatePost;
use spartan_db::repositories::{CommentRepo, PostRepo, UserRepo};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn non_admin_is_forbidden(pool: PgPool) {
    seed_user(&pool, "alice", false).await;
    let app = common::build_test_app(pool);
    let token = login(app.clone(), "alice").await;

    let response = get_auth(app, "/api/admin/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Admin access required");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invite_code_lifecycle(pool: PgPool) {
    seed_user(&pool, "root", true).await;
    let app = common::build_test_app(pool);
    let token = login(app.clone(), "root").await;

    let response = post_json_auth(
        app.clone(),
        "/api/admin/invite-codes",
        json!({ "expiryDays": 7 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let invite = body_json(response).await;
    let code = invite["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 8);
    assert!(invite["expiresAt"].is_string());

    let response = post_json(
        app.clone(),
        "/api/auth/register",
        json!({
            "username": "invited",
            "email": "invited@example.com",
            "password": "a-long-password",
            "inviteCode": code,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let list = body_json(get_auth(app.clone(), "/api/admin/invite-codes", &token).await).await;
    assert_eq!(list[0]["usedByUsername"], "invited");

    let id = invite["id"].as_str().unwrap();
    let uri = format!("/api/admin/invite-codes/{id}");
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = delete_auth(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn negative_expiry_is_rejected(pool: PgPool) {
    seed_user(&pool, "root", true).await;
    let app = common::build_test_app(pool);
    let token = login(app.clone(), "root").await;

    let response = post_json_auth(
        app,
        "/api/admin/invite-codes",
        json!({ "expiryDays": -1 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn oversized_expiry_is_rejected(pool: PgPool) {
    seed_user(&pool, "root", true).await;
    let app = common::build_test_app(pool);
    let token = login(app.clone(), "root").await;

    for days in [1_000_000_000_i64, i64::MAX] {
        let response = post_json_auth(
            app.clone(),
            "/api/admin/invite-codes",
            json!({ "expiryDays": days }),
            &token,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "expiryDays is too large");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_cannot_delete_admins(pool: PgPool) {
    seed_user(&pool, "root", true).await;
    let other_admin = seed_user(&pool, "root2", true).await;
    let app = common::build_test_app(pool);
    let token = login(app.clone(), "root").await;

    let response = delete_auth(
        app,
        &format!("/api/admin/users/{}", other_admin.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_user_deletion_removes_media_and_sessions(pool: PgPool) {
    seed_user(&pool, "root", true).await;
    let victim = seed_user(&pool, "victim", false).await;
    PostRepo::create(
        &pool,
        &CreatePost {
            user_id: victim.id,
            caption: "clip".to_string(),
            media_url: "https://test-bucket.s3.amazonaws.com/videos/clip.mp4".to_string(),
            media_type: "video".to_string(),
            thumbnail_url: Some(
                "https://test-bucket.s3.amazonaws.com/images/clip.jpg".to_string(),
            ),
        },
    )
    .await
    .unwrap();
    let app = common::build_test_app_with_storage(pool.clone());
    let token = login(app.app(), "root").await;
    let victim_token = login(app.app(), "victim").await;

    let response = delete_auth(
        app.app(),
        &format!("/api/admin/users/{}", victim.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(UserRepo::find_by_id(&pool, victim.id).await.unwrap().is_none());
    assert_eq!(
        app.storage.deleted(),
        vec!["videos/clip.mp4".to_string(), "images/clip.jpg".to_string()]
    );

    let response = get_auth(app.app(), "/api/users/me", &victim_token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_moderates_any_post_and_comment(pool: PgPool) {
    seed_user(&pool, "root", true).await;
    let alice = seed_user(&pool, "alice", false).await;
    let post = PostRepo::create(
        &pool,
        &CreatePost {
            user_id: alice.id,
            caption: "hello".to_string(),
            media_url: "https://test-bucket.s3.amazonaws.com/images/hello.jpg".to_string(),
            media_type: "image".to_string(),
            thumbnail_url: None,
        },
    )
    .await
    .unwrap();
    let comment = CommentRepo::create(&pool, post.id, alice.id, "first!")
        .await
        .unwrap();
    let app = common::build_test_app_with_storage(pool);
    let token = login(app.app(), "root").await;

    let comments = body_json(get_auth(app.app(), "/api/admin/comments", &token).await).await;
    assert_eq!(comments[0]["postCaption"], "hello");
    assert_eq!(comments[0]["username"], "alice");

    let response = delete_auth(
        app.app(),
        &format!("/api/admin/comments/{}", comment.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = delete_auth(app.app(), &format!("/api/admin/posts/{}", post.id), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.storage.deleted(), vec!["images/hello.jpg".to_string()]);

    let users = body_json(get_auth(app.app(), "/api/admin/users", &token).await).await;
    let alice_row = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "alice")
        .unwrap();
    assert_eq!(alice_row["postCount"], 0);
    assert_eq!(alice_row["commentCount"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bootstrap_creates_admin_only_once(pool: PgPool) {
    let created = spartan_api::bootstrap::bootstrap_admin(&pool)
        .await
        .unwrap()
        .expect("first run should create an admin");
    assert_eq!(created.username, "admin");
    assert!(created.is_admin);

    let second = spartan_api::bootstrap::bootstrap_admin(&pool).await.unwrap();
    assert!(second.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bootstrap_picks_free_username(pool: PgPool) {
    seed_user(&pool, "admin", false).await;

    let created = spartan_api::bootstrap::bootstrap_admin(&pool)
        .await
        .unwrap()
        .expect("no admin exists yet");
    assert!(created.username.starts_with("admin_"));
    assert_eq!(created.username.len(), "admin_".len() + 6);
}
