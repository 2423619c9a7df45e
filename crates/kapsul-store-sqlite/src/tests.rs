//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use kapsul_core::{
  extinguisher::{ExtinguisherPatch, ExtinguisherType, NewExtinguisher},
  identity::{NewUser, Role, Session, UserStore},
  status::Status,
  store::{ChangeFeed, ExtinguisherStore, TableChange},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn unit(code: &str, location: &str) -> NewExtinguisher {
  NewExtinguisher {
    code:               code.into(),
    location:           location.into(),
    kind:               ExtinguisherType::Powder,
    capacity:           "6".into(),
    last_recharge_date: "1403/06/20".into(),
    next_recharge_date: "1404/06/20".into(),
    status:             Status::Active,
    notes:              String::new(),
  }
}

// ─── Extinguishers ───────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get() {
  let s = store().await;

  let created = s.insert_one(unit("FE-001", "Lobby")).await.unwrap();
  assert_eq!(created.code, "FE-001");
  assert_eq!(created.created_at, created.updated_at);

  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.id, created.id);
  assert_eq!(fetched.kind, ExtinguisherType::Powder);
  assert_eq!(fetched.next_recharge_date, "1404/06/20");
  assert_eq!(fetched.status, Status::Active);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_is_newest_first() {
  let s = store().await;
  s.insert_one(unit("FE-001", "A")).await.unwrap();
  s.insert_one(unit("FE-002", "B")).await.unwrap();
  s.insert_many(vec![unit("FE-003", "C"), unit("FE-004", "D")])
    .await
    .unwrap();

  let codes: Vec<_> = s
    .list_all()
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.code)
    .collect();
  assert_eq!(codes, ["FE-004", "FE-003", "FE-002", "FE-001"]);
}

#[tokio::test]
async fn insert_many_of_nothing_is_a_no_op() {
  let s = store().await;
  assert!(s.insert_many(Vec::new()).await.unwrap().is_empty());
  assert!(s.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn patch_sets_only_given_fields() {
  let s = store().await;
  let created = s.insert_one(unit("FE-001", "Lobby")).await.unwrap();

  let patch = ExtinguisherPatch {
    kind: Some(ExtinguisherType::Co2),
    next_recharge_date: Some("1408/06/20".into()),
    status: Some(Status::OutOfOrder),
    ..Default::default()
  };
  let updated = s.update(created.id, patch).await.unwrap().unwrap();
  assert_eq!(updated.kind, ExtinguisherType::Co2);
  assert_eq!(updated.next_recharge_date, "1408/06/20");
  assert_eq!(updated.status, Status::OutOfOrder);
  assert_eq!(updated.location, "Lobby");
  assert_eq!(updated.last_recharge_date, "1403/06/20");
  assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn patch_unknown_id_returns_none() {
  let s = store().await;
  let patch = ExtinguisherPatch { notes: Some("x".into()), ..Default::default() };
  assert!(s.update(Uuid::new_v4(), patch).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_reports_whether_a_row_went() {
  let s = store().await;
  let created = s.insert_one(unit("FE-001", "Lobby")).await.unwrap();
  assert!(s.delete(created.id).await.unwrap());
  assert!(!s.delete(created.id).await.unwrap());
  assert!(s.get(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn persian_text_round_trips() {
  let s = store().await;
  let mut input = unit("FE-001", "انبار - قفسه ۲");
  input.notes = "بازدید شد".into();
  let created = s.insert_one(input).await.unwrap();
  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.location, "انبار - قفسه ۲");
  assert_eq!(fetched.notes, "بازدید شد");
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn writes_publish_changes() {
  let s = store().await;
  let mut rx = s.subscribe();

  let created = s.insert_one(unit("FE-001", "Lobby")).await.unwrap();
  assert_eq!(rx.recv().await.unwrap(), TableChange::Inserted);

  let patch = ExtinguisherPatch { notes: Some("x".into()), ..Default::default() };
  s.update(created.id, patch).await.unwrap();
  assert_eq!(rx.recv().await.unwrap(), TableChange::Updated);

  s.delete(created.id).await.unwrap();
  assert_eq!(rx.recv().await.unwrap(), TableChange::Deleted);

  // A miss publishes nothing.
  s.delete(created.id).await.unwrap();
  assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn clones_share_the_feed() {
  let s = store().await;
  let mut rx = s.subscribe();
  s.clone().insert_one(unit("FE-001", "Lobby")).await.unwrap();
  assert_eq!(rx.recv().await.unwrap(), TableChange::Inserted);
}

// ─── Users and sessions ──────────────────────────────────────────────────────

fn new_user(email: &str, role: Role) -> NewUser {
  NewUser {
    email:         email.into(),
    full_name:     "Test User".into(),
    password_hash: "$argon2id$stub".into(),
    role,
  }
}

#[tokio::test]
async fn duplicate_email_is_refused() {
  let s = store().await;
  let user = s.create_user(new_user("a@example.com", Role::Admin)).await.unwrap();
  assert!(user.is_some());
  let again = s.create_user(new_user("a@example.com", Role::Viewer)).await.unwrap();
  assert!(again.is_none());
}

#[tokio::test]
async fn credentials_and_user_lookup() {
  let s = store().await;
  let user = s
    .create_user(new_user("a@example.com", Role::Admin))
    .await
    .unwrap()
    .unwrap();

  let record = s.find_credentials("a@example.com").await.unwrap().unwrap();
  assert_eq!(record.user.user_id, user.user_id);
  assert_eq!(record.user.role, Role::Admin);
  assert_eq!(record.password_hash, "$argon2id$stub");

  assert!(s.find_credentials("b@example.com").await.unwrap().is_none());
  assert_eq!(s.get_user(user.user_id).await.unwrap().unwrap().email, "a@example.com");
}

#[tokio::test]
async fn session_lifecycle() {
  let s = store().await;
  let user = s
    .create_user(new_user("a@example.com", Role::Viewer))
    .await
    .unwrap()
    .unwrap();

  let now = Utc::now();
  let session = Session {
    token_hash: "abc123".into(),
    user_id:    user.user_id,
    created_at: now,
    expires_at: now + Duration::hours(1),
  };
  s.create_session(session.clone()).await.unwrap();

  let found = s.find_session("abc123").await.unwrap().unwrap();
  assert_eq!(found.user_id, user.user_id);
  assert!(!found.is_expired(now));

  s.delete_session("abc123").await.unwrap();
  assert!(s.find_session("abc123").await.unwrap().is_none());
  // Idempotent.
  s.delete_session("abc123").await.unwrap();
}
