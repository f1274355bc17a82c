//! Reply notifications.
//!
//! One notification is written for the parent comment's author whenever
//! someone else replies. The only mutation afterwards is marking it read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  actor::ActorId,
  comment::CommentId,
  subject::{Domain, SubjectId},
};

pub type NotificationId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
  /// Reply in a blog post thread.
  CommentReply,
  PhotoCommentReply,
  VideoCommentReply,
}

impl NotificationKind {
  pub fn for_domain(domain: Domain) -> Self {
    match domain {
      Domain::Post => Self::CommentReply,
      Domain::Photo => Self::PhotoCommentReply,
      Domain::Video => Self::VideoCommentReply,
    }
  }
}

/// Enough context for a client to link straight to the reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
  pub domain:              Domain,
  pub subject_id:          SubjectId,
  pub comment_id:          CommentId,
  pub reply_id:            CommentId,
  pub sender_actor_id:     ActorId,
  pub sender_display_name: String,
  pub text_preview:        String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id:                 NotificationId,
  pub recipient_actor_id: ActorId,
  #[serde(rename = "type")]
  pub kind:               NotificationKind,
  pub payload:            NotificationPayload,
  pub created_at:         DateTime<Utc>,
  pub read_at:            Option<DateTime<Utc>>,
}

impl Notification {
  pub fn is_read(&self) -> bool { self.read_at.is_some() }
}

/// Input to [`crate::store::NotificationRepository::insert_notification`].
#[derive(Debug, Clone)]
pub struct NewNotification {
  pub recipient_actor_id: ActorId,
  pub kind:               NotificationKind,
  pub payload:            NotificationPayload,
}

/// `GET /notifications` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
  pub unread_count:  u64,
  pub notifications: Vec<Notification>,
}

/// `POST /notifications/{id}/read` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
  pub notification: Notification,
  pub unread_count: u64,
}

/// Shorten reply text for the notification payload, appending an ellipsis
/// when anything was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
  let mut chars = text.chars();
  let head: String = chars.by_ref().take(max_chars).collect();
  if chars.next().is_some() { format!("{head}…") } else { head }
}
