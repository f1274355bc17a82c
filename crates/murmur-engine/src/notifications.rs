//! Reply notifications: dispatch on reply, listing, and read marking.

use chrono::Utc;
use murmur_core::{
  Error, Result,
  actor::Actor,
  comment::Comment,
  notification::{
    MarkedRead, NewNotification, NotificationId, NotificationKind, NotificationList,
    NotificationPayload, preview,
  },
  rate_limit::RateLimiter,
  store::Store,
  visibility::require_actor,
};

use crate::Engine;

impl<S, L> Engine<S, L>
where
  S: Store,
  L: RateLimiter,
{
  /// Tell the parent's author about a new reply. Self-replies are silent.
  ///
  /// The reply is already stored when this runs, so a failure here is
  /// logged and swallowed rather than failing the request.
  pub(crate) async fn dispatch_reply(&self, parent: &Comment, reply: &Comment, sender: &Actor) {
    if parent.author_id == sender.id {
      return;
    }
    let input = NewNotification {
      recipient_actor_id: parent.author_id.clone(),
      kind:               NotificationKind::for_domain(parent.domain),
      payload:            NotificationPayload {
        domain:              parent.domain,
        subject_id:          parent.subject_id,
        comment_id:          parent.id,
        reply_id:            reply.id,
        sender_actor_id:     sender.id.clone(),
        sender_display_name: sender.display_name.clone(),
        text_preview:        preview(&reply.text, self.config.preview_len),
      },
    };
    match self.store.insert_notification(input).await {
      Ok(n) => tracing::debug!(notification = n.id, recipient = %n.recipient_actor_id, "reply notification sent"),
      Err(e) => tracing::error!(reply = reply.id, error = %e, "failed to record reply notification"),
    }
  }

  /// The caller's newest notifications plus their unread total.
  pub async fn notifications(&self, actor: Option<&Actor>) -> Result<NotificationList> {
    let actor = require_actor(actor)?;
    let notifications = self
      .store
      .list_notifications(&actor.id, self.config.notification_limit)
      .await
      .map_err(Error::internal)?;
    let unread_count = self.unread(actor).await?;
    Ok(NotificationList { unread_count, notifications })
  }

  /// Mark one of the caller's notifications read. Another actor's
  /// notification is reported as missing.
  pub async fn mark_read(&self, id: NotificationId, actor: Option<&Actor>) -> Result<MarkedRead> {
    let actor = require_actor(actor)?;
    let notification = self
      .store
      .mark_read(id, &actor.id, Utc::now())
      .await
      .map_err(Error::internal)?
      .ok_or_else(|| Error::not_found("notification"))?;
    let unread_count = self.unread(actor).await?;
    Ok(MarkedRead { notification, unread_count })
  }

  /// Mark everything read; returns how many notifications changed.
  pub async fn mark_all_read(&self, actor: Option<&Actor>) -> Result<u64> {
    let actor = require_actor(actor)?;
    let updated = self
      .store
      .mark_all_read(&actor.id, Utc::now())
      .await
      .map_err(Error::internal)?;
    tracing::debug!(actor = %actor.id, updated, "notifications marked read");
    Ok(updated)
  }

  async fn unread(&self, actor: &Actor) -> Result<u64> {
    self
      .store
      .count_unread(&actor.id)
      .await
      .map_err(Error::internal)
  }
}
