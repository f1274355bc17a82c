//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so lexical order equals chronological order. Notification
//! payloads are stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use murmur_core::{
  actor::{Actor, Role},
  comment::Comment,
  notification::{Notification, NotificationKind},
  reaction::TargetKind,
  subject::Domain,
};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The current instant, truncated to what the column can hold so that a
/// value handed back to the caller equals the value read back later.
pub fn now() -> DateTime<Utc> {
  let now = Utc::now();
  decode_dt(&encode_dt(now)).unwrap_or(now)
}

// ─── Domain / target kind ────────────────────────────────────────────────────

pub fn encode_domain(d: Domain) -> &'static str { d.as_str() }

pub fn decode_domain(s: &str) -> Result<Domain> {
  s.parse::<Domain>()
    .map_err(|_| Error::Decode(format!("unknown domain: {s:?}")))
}

pub fn encode_target_kind(k: TargetKind) -> &'static str {
  match k {
    TargetKind::Comment => "comment",
    TargetKind::Subject(domain) => encode_domain(domain),
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Admin => "admin",
    Role::User => "user",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "admin" => Ok(Role::Admin),
    "user" => Ok(Role::User),
    other => Err(Error::Decode(format!("unknown role: {other:?}"))),
  }
}

// ─── NotificationKind ────────────────────────────────────────────────────────

pub fn encode_notification_kind(k: NotificationKind) -> &'static str {
  match k {
    NotificationKind::CommentReply => "COMMENT_REPLY",
    NotificationKind::PhotoCommentReply => "PHOTO_COMMENT_REPLY",
    NotificationKind::VideoCommentReply => "VIDEO_COMMENT_REPLY",
  }
}

pub fn decode_notification_kind(s: &str) -> Result<NotificationKind> {
  match s {
    "COMMENT_REPLY" => Ok(NotificationKind::CommentReply),
    "PHOTO_COMMENT_REPLY" => Ok(NotificationKind::PhotoCommentReply),
    "VIDEO_COMMENT_REPLY" => Ok(NotificationKind::VideoCommentReply),
    other => Err(Error::Decode(format!("unknown notification kind: {other:?}"))),
  }
}

// ─── Session tokens ──────────────────────────────────────────────────────────

/// Lowercase hex SHA-256 of a session token.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawComment::from_row`].
pub const COMMENT_COLUMNS: &str = "comment_id, domain, subject_id, author_id, parent_id, \
                                   text, created_at, deleted_at, idempotency_key";

/// Raw values read directly from a `comments` row.
pub struct RawComment {
  pub comment_id:      i64,
  pub domain:          String,
  pub subject_id:      i64,
  pub author_id:       String,
  pub parent_id:       Option<i64>,
  pub text:            String,
  pub created_at:      String,
  pub deleted_at:      Option<String>,
  pub idempotency_key: Option<String>,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:      row.get(0)?,
      domain:          row.get(1)?,
      subject_id:      row.get(2)?,
      author_id:       row.get(3)?,
      parent_id:       row.get(4)?,
      text:            row.get(5)?,
      created_at:      row.get(6)?,
      deleted_at:      row.get(7)?,
      idempotency_key: row.get(8)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:              self.comment_id,
      subject_id:      self.subject_id,
      domain:          decode_domain(&self.domain)?,
      author_id:       self.author_id,
      parent_id:       self.parent_id,
      text:            self.text,
      created_at:      decode_dt(&self.created_at)?,
      deleted_at:      self.deleted_at.as_deref().map(decode_dt).transpose()?,
      idempotency_key: self.idempotency_key,
    })
  }
}

/// Column list matching [`RawNotification::from_row`].
pub const NOTIFICATION_COLUMNS: &str =
  "notification_id, recipient_id, kind, payload_json, created_at, read_at";

/// Raw values read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: i64,
  pub recipient_id:    String,
  pub kind:            String,
  pub payload_json:    String,
  pub created_at:      String,
  pub read_at:         Option<String>,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      recipient_id:    row.get(1)?,
      kind:            row.get(2)?,
      payload_json:    row.get(3)?,
      created_at:      row.get(4)?,
      read_at:         row.get(5)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      id:                 self.notification_id,
      recipient_actor_id: self.recipient_id,
      kind:               decode_notification_kind(&self.kind)?,
      payload:            serde_json::from_str(&self.payload_json)?,
      created_at:         decode_dt(&self.created_at)?,
      read_at:            self.read_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from an `actors` row.
pub struct RawActor {
  pub actor_id:     String,
  pub display_name: String,
  pub role:         String,
  pub banned:       bool,
  pub ban_reason:   Option<String>,
}

impl RawActor {
  pub fn into_actor(self) -> Result<Actor> {
    Ok(Actor {
      id:           self.actor_id,
      display_name: self.display_name,
      role:         decode_role(&self.role)?,
      banned:       self.banned,
      ban_reason:   self.ban_reason,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 120_000_000).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(encode_dt(a).len(), encode_dt(b).len());
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn token_hash_is_hex_sha256() {
    let h = hash_token("secret");
    assert_eq!(h.len(), 64);
    assert_ne!(h, "secret");
    assert_eq!(h, hash_token("secret"));
  }
}
