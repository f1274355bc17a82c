//! Repository traits and the umbrella [`Store`] bound.
//!
//! Traits are implemented by storage backends (e.g. `murmur-store-sqlite`).
//! The engine depends on these abstractions, never on a concrete backend,
//! and each trait can be faked independently in tests.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{
  collections::{HashMap, HashSet},
  future::Future,
};

use chrono::{DateTime, Utc};

use crate::{
  actor::{Actor, ActorId},
  comment::{Comment, CommentId, NewComment},
  notification::{NewNotification, Notification, NotificationId},
  reaction::{ReactionTarget, TargetKind},
  subject::{Subject, SubjectRef},
  visibility::Visibility,
};

/// Shared error type for every repository a backend implements.
pub trait Repository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

// ─── Collaborator lookups ────────────────────────────────────────────────────

/// Per-domain subject capability: identity and publication state.
pub trait SubjectDirectory: Repository {
  /// Look up a subject. Returns `None` if it does not exist.
  fn get_subject(
    &self,
    subject: SubjectRef,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;
}

/// The identity side: sessions and public author names.
pub trait ActorDirectory: Repository {
  /// Resolve a bearer/session token to an actor. `None` for unknown tokens.
  fn resolve_session<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<Actor>, Self::Error>> + Send + 'a;

  /// Batched display-name lookup. Unknown ids are simply absent.
  fn display_names<'a>(
    &'a self,
    ids: &'a [ActorId],
  ) -> impl Future<Output = Result<HashMap<ActorId, String>, Self::Error>> + Send + 'a;
}

// ─── Comments ────────────────────────────────────────────────────────────────

pub trait CommentRepository: Repository {
  /// Persist a new comment. `id` and `created_at` are assigned by the store.
  fn insert_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Fetch a comment regardless of its deletion state.
  fn get_comment(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// The comment previously created by `author` under `key`, if any.
  fn find_by_idempotency_key<'a>(
    &'a self,
    author: &'a str,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + 'a;

  /// Root comments for a subject, newest first, filtered by `visibility`.
  fn list_roots(
    &self,
    subject: SubjectRef,
    visibility: Visibility,
    offset: u64,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Number of root comments [`list_roots`](Self::list_roots) can page over.
  fn count_roots(
    &self,
    subject: SubjectRef,
    visibility: Visibility,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// All replies to a root comment, oldest first.
  fn list_replies(
    &self,
    parent: CommentId,
    visibility: Visibility,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Reply counts for many parents in one query. Parents with no visible
  /// replies may be absent from the map.
  fn count_replies<'a>(
    &'a self,
    parents: &'a [CommentId],
    visibility: Visibility,
  ) -> impl Future<Output = Result<HashMap<CommentId, u64>, Self::Error>> + Send + 'a;

  /// Stamp `deleted_at` if unset and return the row. An already-deleted
  /// comment keeps its original timestamp. `None` if the id is unknown.
  fn soft_delete(
    &self,
    id: CommentId,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;
}

// ─── Reactions ───────────────────────────────────────────────────────────────

/// Uniqueness of `(target, actor)` must be enforced by the storage layer
/// itself, not checked-then-inserted.
pub trait ReactionRepository: Repository {
  /// Insert the like if absent. Returns `true` if a row was created.
  fn add_reaction<'a>(
    &'a self,
    target: ReactionTarget,
    actor: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete the like if present. Returns `true` if a row was removed.
  fn remove_reaction<'a>(
    &'a self,
    target: ReactionTarget,
    actor: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn count_reactions(
    &self,
    target: ReactionTarget,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Like counts for many targets of one kind.
  fn count_reactions_many<'a>(
    &'a self,
    kind: TargetKind,
    ids: &'a [i64],
  ) -> impl Future<Output = Result<HashMap<i64, u64>, Self::Error>> + Send + 'a;

  /// The subset of `ids` that `actor` has liked.
  fn reacted_among<'a>(
    &'a self,
    kind: TargetKind,
    ids: &'a [i64],
    actor: &'a str,
  ) -> impl Future<Output = Result<HashSet<i64>, Self::Error>> + Send + 'a;
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub trait NotificationRepository: Repository {
  fn insert_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Newest first, at most `limit` rows.
  fn list_notifications<'a>(
    &'a self,
    recipient: &'a str,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + 'a;

  fn count_unread<'a>(
    &'a self,
    recipient: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Set `read_at` once. `None` if the notification does not exist or
  /// belongs to someone else.
  fn mark_read<'a>(
    &'a self,
    id: NotificationId,
    recipient: &'a str,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Notification>, Self::Error>> + Send + 'a;

  /// Mark every unread notification for `recipient`; returns how many changed.
  fn mark_all_read<'a>(
    &'a self,
    recipient: &'a str,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}

// ─── Umbrella ────────────────────────────────────────────────────────────────

/// Everything the engine needs from one backend.
pub trait Store:
  SubjectDirectory
  + ActorDirectory
  + CommentRepository
  + ReactionRepository
  + NotificationRepository
{
}

impl<T> Store for T where
  T: SubjectDirectory
    + ActorDirectory
    + CommentRepository
    + ReactionRepository
    + NotificationRepository
{
}
