//! PostgreSQL repository tests. They run against `TEST_DATABASE_URL` and
//! return early when it is not set.

use chrono::{Duration, DurationRound, Utc};
use uuid::Uuid;
use website_backend::{
    models::{session_token::SessionToken, timesheet::TimesheetEntry, user::StoredUser},
    repositories::{
        PgTimesheetRepository, PgTokenRepository, PgUserRepository, StoreError,
        TimesheetRepository, TokenRepository, UserRepository,
    },
    types::{TimesheetEntryId, UserId},
};

mod support;

fn now() -> chrono::DateTime<Utc> {
    // Postgres keeps microseconds.
    Utc::now()
        .duration_trunc(Duration::microseconds(1))
        .expect("truncate timestamp")
}

fn stored_user() -> StoredUser {
    StoredUser {
        id: UserId::new(),
        username: format!("user-{}", Uuid::new_v4()),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        capabilities: vec!["TIMES/READ".into()],
        created_at: now(),
    }
}

#[tokio::test]
async fn users_roundtrip_and_names_are_unique() {
    let Some(pool) = support::test_pool().await else {
        return;
    };
    let repo = PgUserRepository::new(pool);
    let user = stored_user();
    repo.insert_user(&user).await.expect("insert");

    let found = repo.find_user_by_name(&user.username).await.unwrap().unwrap();
    assert_eq!(found, user);
    let by_id = repo.find_user_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, user.username);

    let mut clash = stored_user();
    clash.username = user.username.clone();
    assert!(matches!(
        repo.insert_user(&clash).await,
        Err(StoreError::Conflict)
    ));

    assert!(repo.delete_user_by_name(&user.username).await.unwrap());
    assert!(repo.find_user_by_id(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn token_updates_are_monotonic_and_revocation_sticks() {
    let Some(pool) = support::test_pool().await else {
        return;
    };
    let users = PgUserRepository::new(pool.clone());
    let tokens = PgTokenRepository::new(pool);
    let user = stored_user();
    users.insert_user(&user).await.unwrap();

    let t0 = now();
    let token = SessionToken::new(user.id, t0);
    tokens.insert_token(&token).await.unwrap();
    assert!(matches!(
        tokens.insert_token(&token).await,
        Err(StoreError::Conflict)
    ));

    assert!(tokens.touch_token(&token.id, t0 + Duration::minutes(5)).await.unwrap());
    assert!(tokens.touch_token(&token.id, t0 + Duration::minutes(1)).await.unwrap());
    let stored = tokens.find_token_by_id(&token.id).await.unwrap().unwrap();
    assert_eq!(stored.last_seen_at, t0 + Duration::minutes(5));

    let revoked_at = t0 + Duration::minutes(10);
    assert!(tokens.revoke_token(&token.id, revoked_at).await.unwrap());
    assert!(tokens.touch_token(&token.id, t0 + Duration::minutes(20)).await.unwrap());
    assert!(tokens.revoke_token(&token.id, t0 + Duration::minutes(30)).await.unwrap());
    let stored = tokens.find_token_by_id(&token.id).await.unwrap().unwrap();
    assert!(stored.revoked);
    assert_eq!(stored.last_seen_at, revoked_at);

    // Deleting the user cascades to their tokens.
    users.delete_user_by_name(&user.username).await.unwrap();
    assert!(tokens.find_token_by_id(&token.id).await.unwrap().is_none());
}

#[tokio::test]
async fn purge_deletes_only_records_older_than_the_cutoff() {
    let Some(pool) = support::test_pool().await else {
        return;
    };
    let users = PgUserRepository::new(pool.clone());
    let tokens = PgTokenRepository::new(pool);
    let user = stored_user();
    users.insert_user(&user).await.unwrap();

    // Far enough in the past that no other test's records qualify.
    let ancient = SessionToken::new(user.id, now() - Duration::days(3650));
    let recent = SessionToken::new(user.id, now());
    tokens.insert_token(&ancient).await.unwrap();
    tokens.insert_token(&recent).await.unwrap();

    let purged = tokens
        .purge_tokens_before(now() - Duration::days(3000))
        .await
        .unwrap();
    assert!(purged >= 1);
    assert!(tokens.find_token_by_id(&ancient.id).await.unwrap().is_none());
    assert!(tokens.find_token_by_id(&recent.id).await.unwrap().is_some());
}

#[tokio::test]
async fn timesheet_entries_are_owner_scoped() {
    let Some(pool) = support::test_pool().await else {
        return;
    };
    let users = PgUserRepository::new(pool.clone());
    let entries = PgTimesheetRepository::new(pool);
    let owner = stored_user();
    let other = stored_user();
    users.insert_user(&owner).await.unwrap();
    users.insert_user(&other).await.unwrap();

    let start = now();
    let entry = TimesheetEntry {
        id: TimesheetEntryId::new(),
        user_id: owner.id,
        start,
        end: start + Duration::hours(8),
        breaks: 45,
        morning: "planning".into(),
        afternoon: "coding".into(),
    };
    assert!(entries.save_entry(&entry).await.unwrap());

    let mut hijack = entry.clone();
    hijack.user_id = other.id;
    assert!(!entries.save_entry(&hijack).await.unwrap());
    assert!(!entries.delete_entry(other.id, entry.id).await.unwrap());

    let listed = entries.entries_for_user(owner.id, None, None).await.unwrap();
    assert_eq!(listed, vec![entry.clone()]);
    assert!(entries
        .entries_for_user(other.id, None, None)
        .await
        .unwrap()
        .is_empty());

    assert!(entries.delete_entry(owner.id, entry.id).await.unwrap());
}
