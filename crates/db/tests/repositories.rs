//! Integration tests for the repository layer against a real database:
//! - Invite-gated registration is atomic
//! - Session revocation keeps the current session
//! - Likes are idempotent and keep the counter in step
//! - Post and account deletion cascade

use chrono::{Duration, Utc};
use sqlx::PgPool;
use spartan_db::models::invite_code::CreateInviteCode;
use spartan_db::models::post::CreatePost;
use spartan_db::models::session::CreateSession;
use spartan_db::models::user::{CreateUser, User};
use spartan_db::repositories::{
    CommentRepo, FollowerRepo, InviteCodeRepo, LikeRepo, PostRepo, SessionRepo, UserRepo,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_user(username: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "not-a-real-hash".to_string(),
        name: None,
        phone_number: None,
        is_admin: false,
    }
}

async fn seed_user(pool: &PgPool, username: &str) -> User {
    UserRepo::create(pool, &new_user(username)).await.unwrap()
}

async fn seed_post(pool: &PgPool, user_id: Uuid) -> spartan_db::models::post::Post {
    PostRepo::create(
        pool,
        &CreatePost {
            user_id,
            caption: "hello".to_string(),
            media_url: "https://bucket.s3.us-east-1.amazonaws.com/images/a.jpg".to_string(),
            media_type: "image".to_string(),
            thumbnail_url: None,
        },
    )
    .await
    .unwrap()
}

async fn seed_session(pool: &PgPool, user_id: Uuid) -> Uuid {
    let now = Utc::now();
    let id = Uuid::new_v4();
    SessionRepo::create(
        pool,
        &CreateSession {
            id,
            user_id,
            token_hash: format!("hash-{id}"),
            device: Some("test".to_string()),
            ip_address: None,
            created_at: now,
            expires_at: now + Duration::days(7),
        },
    )
    .await
    .unwrap();
    id
}

async fn seed_invite(pool: &PgPool, admin: Uuid, code: &str, expires_in: Option<Duration>) {
    InviteCodeRepo::create(
        pool,
        &CreateInviteCode {
            code: code.to_string(),
            created_by: admin,
            expires_at: expires_in.map(|d| Utc::now() + d),
        },
    )
    .await
    .unwrap();
}

async fn user_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_consumes_invite(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    seed_invite(&pool, admin.id, "CODE1234", None).await;

    let user = UserRepo::register_with_invite(&pool, &new_user("alice"), "CODE1234")
        .await
        .unwrap()
        .expect("invite should be redeemable");

    let invite = InviteCodeRepo::find_by_code(&pool, "CODE1234")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invite.used_by, Some(user.id));
    assert_eq!(invite.used_by_username.as_deref(), Some("alice"));
    assert!(invite.used_at.is_some());
    assert!(!invite.is_redeemable(Utc::now()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn used_invite_creates_no_user(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    seed_invite(&pool, admin.id, "ONCEONLY", None).await;

    UserRepo::register_with_invite(&pool, &new_user("first"), "ONCEONLY")
        .await
        .unwrap()
        .unwrap();
    let before = user_count(&pool).await;

    let second = UserRepo::register_with_invite(&pool, &new_user("second"), "ONCEONLY")
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(user_count(&pool).await, before);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_or_unknown_invite_creates_no_user(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    seed_invite(&pool, admin.id, "STALE000", Some(Duration::days(-1))).await;

    let expired = UserRepo::register_with_invite(&pool, &new_user("late"), "STALE000")
        .await
        .unwrap();
    assert!(expired.is_none());

    let unknown = UserRepo::register_with_invite(&pool, &new_user("late"), "NOPE0000")
        .await
        .unwrap();
    assert!(unknown.is_none());
    assert_eq!(user_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_username_rolls_back_invite(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    seed_invite(&pool, admin.id, "RETRY123", None).await;

    let mut dup = new_user("admin");
    dup.email = "other@example.com".to_string();
    let err = UserRepo::register_with_invite(&pool, &dup, "RETRY123")
        .await
        .unwrap_err();
    assert!(matches!(err, sqlx::Error::Database(_)));

    let invite = InviteCodeRepo::find_by_code(&pool, "RETRY123")
        .await
        .unwrap()
        .unwrap();
    assert!(invite.is_redeemable(Utc::now()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_deletion_releases_invite(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    seed_invite(&pool, admin.id, "RELEASE1", None).await;
    let user = UserRepo::register_with_invite(&pool, &new_user("temp"), "RELEASE1")
        .await
        .unwrap()
        .unwrap();

    let media = UserRepo::delete_account_releasing_invite(&pool, user.id)
        .await
        .unwrap();
    assert!(media.is_some());

    let invite = InviteCodeRepo::find_by_code(&pool, "RELEASE1")
        .await
        .unwrap()
        .unwrap();
    assert!(invite.is_redeemable(Utc::now()));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn self_deletion_keeps_invite_consumed(pool: PgPool) {
    let admin = seed_user(&pool, "admin").await;
    seed_invite(&pool, admin.id, "KEEPUSED", None).await;
    let user = UserRepo::register_with_invite(&pool, &new_user("gone"), "KEEPUSED")
        .await
        .unwrap()
        .unwrap();

    UserRepo::delete_account(&pool, user.id).await.unwrap();

    let invite = InviteCodeRepo::find_by_code(&pool, "KEEPUSED")
        .await
        .unwrap()
        .unwrap();
    assert!(invite.used_by.is_none());
    assert!(!invite.is_redeemable(Utc::now()));
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_all_keeps_current_session(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let current = seed_session(&pool, user.id).await;
    seed_session(&pool, user.id).await;
    seed_session(&pool, user.id).await;

    let removed = SessionRepo::delete_all_except(&pool, user.id, current)
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let remaining = SessionRepo::list_active_for_user(&pool, user.id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, current);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_rejects_foreign_session(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    let bobs = seed_session(&pool, bob.id).await;

    assert!(!SessionRepo::delete_for_user(&pool, bobs, alice.id)
        .await
        .unwrap());
    assert!(SessionRepo::is_active(&pool, bobs, bob.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn expired_sessions_are_invisible_and_cleaned(pool: PgPool) {
    let user = seed_user(&pool, "alice").await;
    let id = seed_session(&pool, user.id).await;
    sqlx::query("UPDATE sessions SET expires_at = NOW() - INTERVAL '1 minute' WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();

    assert!(SessionRepo::find_active(&pool, id).await.unwrap().is_none());
    assert!(!SessionRepo::rotate_token(&pool, id, "new").await.unwrap());
    assert_eq!(SessionRepo::cleanup_expired(&pool).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Likes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn like_is_idempotent(pool: PgPool) {
    let author = seed_user(&pool, "author").await;
    let fan = seed_user(&pool, "fan").await;
    let post = seed_post(&pool, author.id).await;

    let first = LikeRepo::like(&pool, post.id, fan.id).await.unwrap().unwrap();
    let second = LikeRepo::like(&pool, post.id, fan.id).await.unwrap().unwrap();
    assert_eq!(first.likes, 1);
    assert_eq!(second.likes, 1);
    assert!(second.liked);

    let unliked = LikeRepo::unlike(&pool, post.id, fan.id).await.unwrap().unwrap();
    let again = LikeRepo::unlike(&pool, post.id, fan.id).await.unwrap().unwrap();
    assert_eq!(unliked.likes, 0);
    assert_eq!(again.likes, 0);
    assert!(!again.liked);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn like_missing_post_is_none(pool: PgPool) {
    let fan = seed_user(&pool, "fan").await;
    assert!(LikeRepo::like(&pool, Uuid::new_v4(), fan.id)
        .await
        .unwrap()
        .is_none());
    assert!(LikeRepo::state(&pool, Uuid::new_v4(), fan.id)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Posts and accounts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn post_delete_cascades(pool: PgPool) {
    let author = seed_user(&pool, "author").await;
    let fan = seed_user(&pool, "fan").await;
    let post = seed_post(&pool, author.id).await;
    CommentRepo::create(&pool, post.id, fan.id, "nice").await.unwrap();
    LikeRepo::like(&pool, post.id, fan.id).await.unwrap();

    // Only the owner (or an unscoped admin call) may delete.
    assert!(PostRepo::delete(&pool, post.id, Some(fan.id))
        .await
        .unwrap()
        .is_none());
    let deleted = PostRepo::delete(&pool, post.id, Some(author.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deleted.id, post.id);

    let comments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments")
        .fetch_one(&pool)
        .await
        .unwrap();
    let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_likes")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!((comments, likes), (0, 0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn post_with_author_carries_comments_and_like_state(pool: PgPool) {
    let author = seed_user(&pool, "author").await;
    let fan = seed_user(&pool, "fan").await;
    let post = seed_post(&pool, author.id).await;
    CommentRepo::create(&pool, post.id, fan.id, "first").await.unwrap();
    CommentRepo::create(&pool, post.id, author.id, "second").await.unwrap();
    LikeRepo::like(&pool, post.id, fan.id).await.unwrap();

    let seen = PostRepo::find_with_author(&pool, post.id, Some(fan.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen.username, "author");
    assert!(seen.liked);
    assert_eq!(seen.likes, 1);
    let contents: Vec<_> = seen.comments.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(contents, ["first", "second"]);

    let anonymous = PostRepo::find_with_author(&pool, post.id, None)
        .await
        .unwrap()
        .unwrap();
    assert!(!anonymous.liked);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn feed_only_contains_followed_authors(pool: PgPool) {
    let reader = seed_user(&pool, "reader").await;
    let followed = seed_user(&pool, "followed").await;
    let stranger = seed_user(&pool, "stranger").await;
    let wanted = seed_post(&pool, followed.id).await;
    seed_post(&pool, stranger.id).await;

    assert!(FollowerRepo::follow(&pool, reader.id, followed.id).await.unwrap());
    assert!(!FollowerRepo::follow(&pool, reader.id, followed.id).await.unwrap());

    let feed = PostRepo::feed(&pool, reader.id, 50, 0).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, wanted.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn account_deletion_returns_media_and_fixes_like_counts(pool: PgPool) {
    let author = seed_user(&pool, "author").await;
    let leaver = seed_user(&pool, "leaver").await;
    let liked = seed_post(&pool, author.id).await;
    seed_post(&pool, leaver.id).await;
    LikeRepo::like(&pool, liked.id, leaver.id).await.unwrap();

    let media = UserRepo::delete_account(&pool, leaver.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(media.len(), 1);

    let after = PostRepo::find_by_id(&pool, liked.id).await.unwrap().unwrap();
    assert_eq!(after.likes, 0);
    assert!(UserRepo::delete_account(&pool, leaver.id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn profile_counts_follow_graph(pool: PgPool) {
    let alice = seed_user(&pool, "alice").await;
    let bob = seed_user(&pool, "bob").await;
    seed_post(&pool, alice.id).await;
    FollowerRepo::follow(&pool, bob.id, alice.id).await.unwrap();

    let profile = UserRepo::profile(&pool, alice.id, Some(bob.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.post_count, 1);
    assert_eq!(profile.follower_count, 1);
    assert_eq!(profile.following_count, 0);
    assert!(profile.is_following);

    let found = UserRepo::search(&pool, "ALI", None, 20).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "alice");
}
