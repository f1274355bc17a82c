//! Comments, replies, and the read model returned to clients.
//!
//! Threads are at most one level deep: a root comment has no parent, and a
//! reply's parent must itself be a root. Comments are never edited; the only
//! mutation is the soft delete, which stamps `deleted_at` and keeps the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  actor::{ActorId, Author},
  page::PageInfo,
  subject::{Domain, SubjectId, SubjectRef},
};

pub type CommentId = i64;

/// Upper bound on comment text, in characters after trimming.
pub const MAX_COMMENT_LEN: usize = 2000;

/// Upper bound on a client-supplied idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

// ─── Stored comment ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id:              CommentId,
  pub subject_id:      SubjectId,
  pub domain:          Domain,
  pub author_id:       ActorId,
  /// `None` for a root comment.
  pub parent_id:       Option<CommentId>,
  pub text:            String,
  pub created_at:      DateTime<Utc>,
  pub deleted_at:      Option<DateTime<Utc>>,
  #[serde(skip)]
  pub idempotency_key: Option<String>,
}

impl Comment {
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }

  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }

  pub fn subject_ref(&self) -> SubjectRef { SubjectRef::new(self.domain, self.subject_id) }
}

// ─── NewComment ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::CommentRepository::insert_comment`].
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub subject:         SubjectRef,
  pub author_id:       ActorId,
  pub parent_id:       Option<CommentId>,
  pub text:            String,
  pub idempotency_key: Option<String>,
}

// ─── Input validation ────────────────────────────────────────────────────────

/// Trim and bound-check comment text, returning the text to persist.
pub fn normalize_text(raw: &str, max_len: usize) -> Result<String> {
  let text = raw.trim();
  if text.is_empty() {
    return Err(Error::validation("comment text must not be empty"));
  }
  let len = text.chars().count();
  if len > max_len {
    return Err(Error::validation(format!(
      "comment text is {len} characters; the limit is {max_len}"
    )));
  }
  Ok(text.to_owned())
}

/// Validate a client-supplied idempotency key.
pub fn normalize_idempotency_key(raw: Option<&str>) -> Result<Option<String>> {
  let Some(raw) = raw else { return Ok(None) };
  let key = raw.trim();
  if key.is_empty()
    || key.len() > MAX_IDEMPOTENCY_KEY_LEN
    || !key.chars().all(|c| c.is_ascii_graphic())
  {
    return Err(Error::validation(
      "idempotency key must be 1-128 printable ASCII characters",
    ));
  }
  Ok(Some(key.to_owned()))
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A comment as returned over HTTP: stored fields plus author, counts, and
/// the caller's own like state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
  pub id:          CommentId,
  pub text:        String,
  pub parent_id:   Option<CommentId>,
  pub created_at:  DateTime<Utc>,
  pub deleted_at:  Option<DateTime<Utc>>,
  pub author:      Author,
  pub like_count:  u64,
  pub reply_count: u64,
  pub liked_by_me: bool,
}

/// One page of root comments for a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
  pub comments:   Vec<CommentView>,
  pub pagination: PageInfo,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn text_is_trimmed() {
    assert_eq!(normalize_text("  hello \n", 10).unwrap(), "hello");
  }

  #[test]
  fn blank_text_is_rejected() {
    assert!(matches!(normalize_text(" \t\n", 10), Err(Error::Validation(_))));
  }

  #[test]
  fn length_is_counted_in_chars_not_bytes() {
    let text = "é".repeat(5);
    assert!(normalize_text(&text, 5).is_ok());
    assert!(matches!(normalize_text(&text, 4), Err(Error::Validation(_))));
  }

  #[test]
  fn idempotency_key_bounds() {
    assert_eq!(normalize_idempotency_key(None).unwrap(), None);
    assert_eq!(
      normalize_idempotency_key(Some(" abc-123 ")).unwrap().as_deref(),
      Some("abc-123")
    );
    assert!(normalize_idempotency_key(Some("")).is_err());
    assert!(normalize_idempotency_key(Some("has space")).is_err());
    assert!(normalize_idempotency_key(Some(&"k".repeat(129))).is_err());
  }
}
