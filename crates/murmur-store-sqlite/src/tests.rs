//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use chrono::Utc;
use murmur_core::{
  actor::{Actor, Role},
  comment::NewComment,
  notification::{NewNotification, NotificationKind, NotificationPayload},
  reaction::{ReactionTarget, TargetKind},
  store::{
    ActorDirectory, CommentRepository, NotificationRepository, ReactionRepository,
    SubjectDirectory,
  },
  subject::{Domain, Subject, SubjectRef},
  visibility::Visibility,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn actor(id: &str, role: Role) -> Actor {
  Actor {
    id:           id.into(),
    display_name: format!("{id} display"),
    role,
    banned:       false,
    ban_reason:   None,
  }
}

async fn published(s: &SqliteStore, domain: Domain, id: i64) -> SubjectRef {
  s.upsert_subject(&Subject { id, domain, is_published: true })
    .await
    .unwrap();
  SubjectRef::new(domain, id)
}

fn root(subject: SubjectRef, author: &str, text: &str) -> NewComment {
  NewComment {
    subject,
    author_id: author.into(),
    parent_id: None,
    text: text.into(),
    idempotency_key: None,
  }
}

fn reply(subject: SubjectRef, parent: i64, author: &str, text: &str) -> NewComment {
  NewComment { parent_id: Some(parent), ..root(subject, author, text) }
}

// ─── Subjects & actors ───────────────────────────────────────────────────────

#[tokio::test]
async fn subjects_are_keyed_by_domain_and_id() {
  let s = store().await;
  published(&s, Domain::Post, 1).await;
  s.upsert_subject(&Subject { id: 1, domain: Domain::Photo, is_published: false })
    .await
    .unwrap();

  let post = s.get_subject(SubjectRef::new(Domain::Post, 1)).await.unwrap().unwrap();
  let photo = s.get_subject(SubjectRef::new(Domain::Photo, 1)).await.unwrap().unwrap();
  assert!(post.is_published);
  assert!(!photo.is_published);
  assert!(s.get_subject(SubjectRef::new(Domain::Video, 1)).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_subject_updates_publication() {
  let s = store().await;
  let subject = published(&s, Domain::Video, 9).await;
  s.upsert_subject(&Subject { id: 9, domain: Domain::Video, is_published: false })
    .await
    .unwrap();
  assert!(!s.get_subject(subject).await.unwrap().unwrap().is_published);
}

#[tokio::test]
async fn session_resolves_to_actor_with_ban_state() {
  let s = store().await;
  let mut a = actor("alice", Role::User);
  a.banned = true;
  a.ban_reason = Some("spam".into());
  s.upsert_actor(&a).await.unwrap();

  let token = s.issue_session("alice").await.unwrap();
  let resolved = s.resolve_session(&token).await.unwrap().unwrap();
  assert_eq!(resolved, a);

  assert!(s.resolve_session("not-a-token").await.unwrap().is_none());
}

#[tokio::test]
async fn issue_session_for_unknown_actor_errors() {
  let s = store().await;
  let err = s.issue_session("ghost").await.unwrap_err();
  assert!(matches!(err, crate::Error::UnknownActor(_)));
}

#[tokio::test]
async fn display_names_are_batched() {
  let s = store().await;
  s.upsert_actor(&actor("a", Role::User)).await.unwrap();
  s.upsert_actor(&actor("b", Role::Admin)).await.unwrap();

  let names = s
    .display_names(&["a".to_string(), "b".to_string(), "zz".to_string()])
    .await
    .unwrap();
  assert_eq!(names.len(), 2);
  assert_eq!(names["a"], "a display");
  assert!(s.display_names(&[]).await.unwrap().is_empty());
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_comment() {
  let s = store().await;
  let subject = published(&s, Domain::Post, 1).await;

  let c = s.insert_comment(root(subject, "alice", "Hello")).await.unwrap();
  assert!(c.is_root());
  assert_eq!(c.subject_ref(), subject);

  let fetched = s.get_comment(c.id).await.unwrap().unwrap();
  assert_eq!(fetched, c);
  assert!(s.get_comment(c.id + 100).await.unwrap().is_none());
}

#[tokio::test]
async fn comment_requires_existing_subject() {
  let s = store().await;
  let missing = SubjectRef::new(Domain::Post, 404);
  assert!(s.insert_comment(root(missing, "alice", "x")).await.is_err());
}

#[tokio::test]
async fn storage_rejects_reply_to_reply() {
  let s = store().await;
  let subject = published(&s, Domain::Post, 1).await;
  let parent = s.insert_comment(root(subject, "a", "root")).await.unwrap();
  let child = s.insert_comment(reply(subject, parent.id, "b", "child")).await.unwrap();

  let err = s.insert_comment(reply(subject, child.id, "c", "grandchild")).await;
  assert!(err.is_err());
}

#[tokio::test]
async fn idempotency_key_returns_first_row() {
  let s = store().await;
  let subject = published(&s, Domain::Photo, 3).await;

  let mut input = root(subject, "alice", "once");
  input.idempotency_key = Some("k-1".into());
  let first = s.insert_comment(input.clone()).await.unwrap();
  let second = s.insert_comment(input).await.unwrap();
  assert_eq!(first.id, second.id);
  assert_eq!(s.count_roots(subject, Visibility::LiveOnly).await.unwrap(), 1);

  let found = s.find_by_idempotency_key("alice", "k-1").await.unwrap().unwrap();
  assert_eq!(found.id, first.id);
  assert!(s.find_by_idempotency_key("bob", "k-1").await.unwrap().is_none());
}

#[tokio::test]
async fn roots_page_newest_first() {
  let s = store().await;
  let subject = published(&s, Domain::Post, 1).await;
  for i in 0..5 {
    s.insert_comment(root(subject, "a", &format!("c{i}"))).await.unwrap();
  }
  // A reply never counts as a root.
  let first = s.list_roots(subject, Visibility::LiveOnly, 0, 10).await.unwrap();
  s.insert_comment(reply(subject, first[0].id, "b", "r")).await.unwrap();

  let page = s.list_roots(subject, Visibility::LiveOnly, 0, 2).await.unwrap();
  let texts: Vec<_> = page.iter().map(|c| c.text.as_str()).collect();
  assert_eq!(texts, ["c4", "c3"]);

  let page = s.list_roots(subject, Visibility::LiveOnly, 4, 2).await.unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].text, "c0");

  assert_eq!(s.count_roots(subject, Visibility::LiveOnly).await.unwrap(), 5);
}

#[tokio::test]
async fn soft_deleted_rows_follow_visibility() {
  let s = store().await;
  let subject = published(&s, Domain::Post, 1).await;
  let keep = s.insert_comment(root(subject, "a", "keep")).await.unwrap();
  let gone = s.insert_comment(root(subject, "a", "gone")).await.unwrap();
  s.insert_comment(reply(subject, keep.id, "b", "r1")).await.unwrap();
  let r2 = s.insert_comment(reply(subject, keep.id, "b", "r2")).await.unwrap();

  s.soft_delete(gone.id, Utc::now()).await.unwrap().unwrap();
  s.soft_delete(r2.id, Utc::now()).await.unwrap().unwrap();

  assert_eq!(s.count_roots(subject, Visibility::LiveOnly).await.unwrap(), 1);
  assert_eq!(s.count_roots(subject, Visibility::Everything).await.unwrap(), 2);

  let live = s.count_replies(&[keep.id, gone.id], Visibility::LiveOnly).await.unwrap();
  assert_eq!(live.get(&keep.id), Some(&1));
  assert_eq!(live.get(&gone.id), None);
  let all = s.count_replies(&[keep.id], Visibility::Everything).await.unwrap();
  assert_eq!(all.get(&keep.id), Some(&2));

  let replies = s.list_replies(keep.id, Visibility::LiveOnly).await.unwrap();
  assert_eq!(replies.len(), 1);
  let replies = s.list_replies(keep.id, Visibility::Everything).await.unwrap();
  assert_eq!(replies.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(), ["r1", "r2"]);
}

#[tokio::test]
async fn soft_delete_keeps_first_timestamp() {
  let s = store().await;
  let subject = published(&s, Domain::Post, 1).await;
  let c = s.insert_comment(root(subject, "a", "x")).await.unwrap();

  let first = s.soft_delete(c.id, Utc::now()).await.unwrap().unwrap();
  let again = s
    .soft_delete(c.id, Utc::now() + chrono::Duration::hours(1))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(first.deleted_at, again.deleted_at);
  assert!(s.soft_delete(9999, Utc::now()).await.unwrap().is_none());
}

// ─── Reactions ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn likes_are_unique_per_actor() {
  let s = store().await;
  let target = ReactionTarget::comment(7);

  assert!(s.add_reaction(target, "alice").await.unwrap());
  assert!(!s.add_reaction(target, "alice").await.unwrap());
  assert!(s.add_reaction(target, "bob").await.unwrap());
  assert_eq!(s.count_reactions(target).await.unwrap(), 2);

  assert!(s.remove_reaction(target, "alice").await.unwrap());
  assert!(!s.remove_reaction(target, "alice").await.unwrap());
  assert_eq!(s.count_reactions(target).await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_likes_collapse_to_one_row() {
  let s = store().await;
  let target = ReactionTarget::comment(1);
  let (a, b) = tokio::join!(s.add_reaction(target, "alice"), s.add_reaction(target, "alice"));
  assert_ne!(a.unwrap(), b.unwrap());
  assert_eq!(s.count_reactions(target).await.unwrap(), 1);
}

#[tokio::test]
async fn target_kinds_do_not_collide() {
  let s = store().await;
  let post = ReactionTarget::subject(SubjectRef::new(Domain::Post, 1));
  let photo = ReactionTarget::subject(SubjectRef::new(Domain::Photo, 1));
  let comment = ReactionTarget::comment(1);

  s.add_reaction(post, "alice").await.unwrap();
  assert_eq!(s.count_reactions(post).await.unwrap(), 1);
  assert_eq!(s.count_reactions(photo).await.unwrap(), 0);
  assert_eq!(s.count_reactions(comment).await.unwrap(), 0);
}

#[tokio::test]
async fn batched_reaction_lookups() {
  let s = store().await;
  for (id, actor) in [(1, "a"), (1, "b"), (2, "b"), (3, "c")] {
    s.add_reaction(ReactionTarget::comment(id), actor).await.unwrap();
  }

  let counts = s.count_reactions_many(TargetKind::Comment, &[1, 2, 4]).await.unwrap();
  assert_eq!(counts.get(&1), Some(&2));
  assert_eq!(counts.get(&2), Some(&1));
  assert_eq!(counts.get(&4), None);

  let mine = s.reacted_among(TargetKind::Comment, &[1, 2, 3], "b").await.unwrap();
  assert_eq!(mine, HashSet::from([1, 2]));
}

// ─── Notifications ───────────────────────────────────────────────────────────

fn notification(recipient: &str, reply_id: i64) -> NewNotification {
  NewNotification {
    recipient_actor_id: recipient.into(),
    kind:               NotificationKind::PhotoCommentReply,
    payload:            NotificationPayload {
      domain:              Domain::Photo,
      subject_id:          5,
      comment_id:          1,
      reply_id,
      sender_actor_id:     "bob".into(),
      sender_display_name: "Bob".into(),
      text_preview:        "hi".into(),
    },
  }
}

#[tokio::test]
async fn notifications_list_newest_first() {
  let s = store().await;
  let first = s.insert_notification(notification("alice", 2)).await.unwrap();
  let second = s.insert_notification(notification("alice", 3)).await.unwrap();
  s.insert_notification(notification("carol", 4)).await.unwrap();

  let list = s.list_notifications("alice", 50).await.unwrap();
  assert_eq!(list.iter().map(|n| n.id).collect::<Vec<_>>(), [second.id, first.id]);
  assert_eq!(list[1].payload, first.payload);
  assert_eq!(list[1].kind, NotificationKind::PhotoCommentReply);

  assert_eq!(s.list_notifications("alice", 1).await.unwrap().len(), 1);
  assert_eq!(s.count_unread("alice").await.unwrap(), 2);
}

#[tokio::test]
async fn mark_read_is_once_and_owner_scoped() {
  let s = store().await;
  let n = s.insert_notification(notification("alice", 2)).await.unwrap();

  assert!(s.mark_read(n.id, "carol", Utc::now()).await.unwrap().is_none());

  let read = s.mark_read(n.id, "alice", Utc::now()).await.unwrap().unwrap();
  let again = s
    .mark_read(n.id, "alice", Utc::now() + chrono::Duration::minutes(5))
    .await
    .unwrap()
    .unwrap();
  assert!(read.is_read());
  assert_eq!(read.read_at, again.read_at);
  assert_eq!(s.count_unread("alice").await.unwrap(), 0);
}

#[tokio::test]
async fn mark_all_read_counts_changes() {
  let s = store().await;
  s.insert_notification(notification("alice", 2)).await.unwrap();
  s.insert_notification(notification("alice", 3)).await.unwrap();

  assert_eq!(s.mark_all_read("alice", Utc::now()).await.unwrap(), 2);
  assert_eq!(s.mark_all_read("alice", Utc::now()).await.unwrap(), 0);
  assert_eq!(s.count_unread("alice").await.unwrap(), 0);
}
