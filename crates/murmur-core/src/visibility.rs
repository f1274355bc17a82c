//! The role-conditional rules deciding what an actor may see and write.
//!
//! Listing and counting both consume the same [`Visibility`] value, so the
//! admin/non-admin split lives in exactly one place.

use crate::{
  Error, Result,
  actor::Actor,
  comment::Comment,
  subject::Subject,
};

/// Fallback message when a ban carries no stored reason.
pub const DEFAULT_BAN_REASON: &str = "your account has been banned";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
  /// Admins: soft-deleted comments and unpublished subjects are visible, and
  /// counts include deleted rows.
  Everything,
  /// Everyone else, anonymous included: only live comments on published
  /// subjects.
  LiveOnly,
}

impl Visibility {
  pub fn for_actor(actor: Option<&Actor>) -> Self {
    match actor {
      Some(a) if a.is_admin() => Self::Everything,
      _ => Self::LiveOnly,
    }
  }

  /// Whether queries under this policy should include soft-deleted rows.
  pub fn includes_deleted(self) -> bool { matches!(self, Self::Everything) }

  pub fn admits_subject(self, subject: &Subject) -> bool {
    subject.is_published || self.includes_deleted()
  }

  pub fn admits_comment(self, comment: &Comment) -> bool {
    !comment.is_deleted() || self.includes_deleted()
  }

  /// Resolve a looked-up subject, hiding unpublished ones as `NotFound`.
  pub fn visible_subject(self, subject: Option<Subject>) -> Result<Subject> {
    match subject {
      Some(s) if self.admits_subject(&s) => Ok(s),
      _ => Err(Error::not_found("subject")),
    }
  }

  /// Resolve a looked-up comment, hiding soft-deleted ones as `NotFound`.
  pub fn visible_comment(self, comment: Option<Comment>) -> Result<Comment> {
    match comment {
      Some(c) if self.admits_comment(&c) => Ok(c),
      _ => Err(Error::not_found("comment")),
    }
  }
}

/// Operations on the caller's own data (their notifications) only need an
/// identity; a ban does not block them.
pub fn require_actor(actor: Option<&Actor>) -> Result<&Actor> { actor.ok_or(Error::AuthRequired) }

/// Gate every write: anonymous callers need to sign in, banned callers are
/// refused with their stored reason. Reads never go through here.
pub fn require_writer(actor: Option<&Actor>) -> Result<&Actor> {
  let actor = require_actor(actor)?;
  if actor.banned {
    let reason = actor
      .ban_reason
      .clone()
      .unwrap_or_else(|| DEFAULT_BAN_REASON.to_owned());
    return Err(Error::Forbidden(reason));
  }
  Ok(actor)
}

/// Gate admin-only operations such as soft delete.
pub fn require_admin(actor: Option<&Actor>) -> Result<&Actor> {
  let actor = require_writer(actor)?;
  if !actor.is_admin() {
    return Err(Error::Forbidden("admin privileges required".to_owned()));
  }
  Ok(actor)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{actor::Role, subject::Domain};

  fn actor(role: Role, banned: bool, reason: Option<&str>) -> Actor {
    Actor {
      id:           "a1".into(),
      display_name: "A".into(),
      role,
      banned,
      ban_reason:   reason.map(str::to_owned),
    }
  }

  fn comment(deleted: bool) -> Comment {
    Comment {
      id:              1,
      subject_id:      1,
      domain:          Domain::Post,
      author_id:       "a1".into(),
      parent_id:       None,
      text:            "x".into(),
      created_at:      Utc::now(),
      deleted_at:      deleted.then(Utc::now),
      idempotency_key: None,
    }
  }

  #[test]
  fn admin_sees_everything() {
    let admin = actor(Role::Admin, false, None);
    let v = Visibility::for_actor(Some(&admin));
    assert_eq!(v, Visibility::Everything);
    assert!(v.admits_comment(&comment(true)));
    assert!(v.admits_subject(&Subject { id: 1, domain: Domain::Photo, is_published: false }));
  }

  #[test]
  fn users_and_anonymous_see_live_only() {
    let user = actor(Role::User, false, None);
    for v in [Visibility::for_actor(Some(&user)), Visibility::for_actor(None)] {
      assert_eq!(v, Visibility::LiveOnly);
      assert!(!v.admits_comment(&comment(true)));
      assert!(v.admits_comment(&comment(false)));
      let hidden = v.visible_subject(Some(Subject {
        id:           1,
        domain:       Domain::Video,
        is_published: false,
      }));
      assert!(matches!(hidden, Err(Error::NotFound(_))));
    }
  }

  #[test]
  fn banned_writer_gets_reason_verbatim() {
    let banned = actor(Role::User, true, Some("spam links"));
    match require_writer(Some(&banned)) {
      Err(Error::Forbidden(reason)) => assert_eq!(reason, "spam links"),
      other => panic!("expected Forbidden, got {other:?}"),
    }
  }

  #[test]
  fn anonymous_writer_needs_auth() {
    assert!(matches!(require_writer(None), Err(Error::AuthRequired)));
  }

  #[test]
  fn non_admin_cannot_moderate() {
    let user = actor(Role::User, false, None);
    assert!(matches!(require_admin(Some(&user)), Err(Error::Forbidden(_))));
    let admin = actor(Role::Admin, false, None);
    assert!(require_admin(Some(&admin)).is_ok());
  }
}
