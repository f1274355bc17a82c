//! Likes on comments and on subjects.
//!
//! A like is a unique `(target, actor)` pair. Counts are always recomputed
//! from the stored rows, never maintained by increment.

use serde::{Deserialize, Serialize};

use crate::{
  comment::CommentId,
  subject::{Domain, SubjectRef},
};

/// What a like points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionTarget {
  Comment { id: CommentId },
  Subject { domain: Domain, id: i64 },
}

impl ReactionTarget {
  pub fn comment(id: CommentId) -> Self { Self::Comment { id } }

  pub fn subject(subject: SubjectRef) -> Self {
    Self::Subject { domain: subject.domain, id: subject.id }
  }

  /// The kind discriminant shared by every target in a batched lookup.
  pub fn kind(&self) -> TargetKind {
    match self {
      Self::Comment { .. } => TargetKind::Comment,
      Self::Subject { domain, .. } => TargetKind::Subject(*domain),
    }
  }

  pub fn id(&self) -> i64 {
    match self {
      Self::Comment { id } | Self::Subject { id, .. } => *id,
    }
  }
}

/// Ids are only unique within a kind, so batched lookups take one kind and
/// many ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
  Comment,
  Subject(Domain),
}

/// The response to like/unlike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
  pub like_count:  u64,
  pub liked_by_me: bool,
}
