//! Comment and reply creation, reply listing, soft delete, and the shared
//! hydration step that turns stored rows into [`CommentView`]s.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use murmur_core::{
  Error, Result,
  actor::{Actor, Author},
  comment::{
    Comment, CommentId, CommentView, NewComment, normalize_idempotency_key, normalize_text,
  },
  rate_limit::RateLimiter,
  reaction::TargetKind,
  store::Store,
  subject::{Domain, SubjectRef},
  visibility::{Visibility, require_admin},
};

use crate::{COMMENT_ACTION, Engine, writer};

/// Shown when the identity side no longer knows a comment's author.
pub const UNKNOWN_AUTHOR: &str = "[deleted user]";

impl<S, L> Engine<S, L>
where
  S: Store,
  L: RateLimiter,
{
  // ── Writes ────────────────────────────────────────────────────────────────

  /// Post a root comment on a subject.
  ///
  /// With an idempotency key, a retry of an earlier successful call returns
  /// the original comment instead of creating a duplicate.
  pub async fn create_root(
    &self,
    subject: SubjectRef,
    actor: Option<&Actor>,
    text: &str,
    idempotency_key: Option<&str>,
  ) -> Result<CommentView> {
    let actor = writer(actor, "create_root")?;
    let text = normalize_text(text, self.config.max_comment_len)?;
    let key = normalize_idempotency_key(idempotency_key)?;
    let visibility = Visibility::for_actor(Some(actor));

    let subject = visibility
      .visible_subject(self.store.get_subject(subject).await.map_err(Error::internal)?)?
      .subject_ref();

    if let Some(existing) = self.replay(actor, key.as_deref()).await? {
      same_target(&existing, subject, None)?;
      return self.view_one(existing, Some(actor), visibility).await;
    }

    self.gate(COMMENT_ACTION, actor, self.config.comment_cooldown()).await?;

    let comment = self
      .store
      .insert_comment(NewComment {
        subject,
        author_id: actor.id.clone(),
        parent_id: None,
        text,
        idempotency_key: key,
      })
      .await
      .map_err(Error::internal)?;
    // A concurrent request with the same key may have won the insert.
    same_target(&comment, subject, None)?;

    tracing::info!(comment = comment.id, %subject, actor = %actor.id, "root comment created");
    Ok(fresh_view(comment, actor))
  }

  /// Reply to a root comment. Replies to replies are rejected.
  ///
  /// The parent's author is notified unless they are replying to themselves.
  pub async fn create_reply(
    &self,
    domain: Domain,
    parent_id: CommentId,
    actor: Option<&Actor>,
    text: &str,
    idempotency_key: Option<&str>,
  ) -> Result<CommentView> {
    let actor = writer(actor, "create_reply")?;
    let text = normalize_text(text, self.config.max_comment_len)?;
    let key = normalize_idempotency_key(idempotency_key)?;
    let visibility = Visibility::for_actor(Some(actor));

    let parent = self.thread_root(domain, parent_id, visibility).await?;

    if let Some(existing) = self.replay(actor, key.as_deref()).await? {
      same_target(&existing, parent.subject_ref(), Some(parent.id))?;
      return self.view_one(existing, Some(actor), visibility).await;
    }

    self.gate(COMMENT_ACTION, actor, self.config.comment_cooldown()).await?;

    let reply = self
      .store
      .insert_comment(NewComment {
        subject:         parent.subject_ref(),
        author_id:       actor.id.clone(),
        parent_id:       Some(parent.id),
        text,
        idempotency_key: key,
      })
      .await
      .map_err(Error::internal)?;
    same_target(&reply, parent.subject_ref(), Some(parent.id))?;

    tracing::info!(reply = reply.id, parent = parent.id, actor = %actor.id, "reply created");
    self.dispatch_reply(&parent, &reply, actor).await;
    Ok(fresh_view(reply, actor))
  }

  /// Mark a comment deleted. Admin only; repeating the call is harmless.
  pub async fn soft_delete(
    &self,
    domain: Domain,
    comment_id: CommentId,
    actor: Option<&Actor>,
  ) -> Result<CommentView> {
    let actor = require_admin(actor)?;

    let comment = self
      .store
      .get_comment(comment_id)
      .await
      .map_err(Error::internal)?
      .filter(|c| c.domain == domain)
      .ok_or_else(|| Error::not_found("comment"))?;

    let deleted = self
      .store
      .soft_delete(comment.id, Utc::now())
      .await
      .map_err(Error::internal)?
      .ok_or_else(|| Error::not_found("comment"))?;

    tracing::info!(comment = deleted.id, actor = %actor.id, "comment soft-deleted");
    self.view_one(deleted, Some(actor), Visibility::Everything).await
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Every visible reply to a root comment, oldest first.
  pub async fn list_replies(
    &self,
    domain: Domain,
    parent_id: CommentId,
    actor: Option<&Actor>,
  ) -> Result<Vec<CommentView>> {
    let visibility = Visibility::for_actor(actor);
    let parent = self.thread_root(domain, parent_id, visibility).await?;
    let replies = self
      .store
      .list_replies(parent.id, visibility)
      .await
      .map_err(Error::internal)?;
    self.views(replies, actor, visibility).await
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  /// Load a comment that must be a visible root in `domain` on a visible
  /// subject.
  async fn thread_root(
    &self,
    domain: Domain,
    id: CommentId,
    visibility: Visibility,
  ) -> Result<Comment> {
    let comment = self.visible_comment(domain, id, visibility).await?;
    if !comment.is_root() {
      return Err(Error::validation("replies cannot be nested; reply to the root comment"));
    }
    Ok(comment)
  }

  /// Load a comment visible under `visibility`, in `domain`, whose subject is
  /// also visible. A reply additionally needs a visible root. Every miss is
  /// `NotFound`.
  pub(crate) async fn visible_comment(
    &self,
    domain: Domain,
    id: CommentId,
    visibility: Visibility,
  ) -> Result<Comment> {
    let comment = visibility
      .visible_comment(self.store.get_comment(id).await.map_err(Error::internal)?)?;
    if comment.domain != domain {
      return Err(Error::not_found("comment"));
    }
    if let Some(parent_id) = comment.parent_id {
      visibility.visible_comment(
        self
          .store
          .get_comment(parent_id)
          .await
          .map_err(Error::internal)?,
      )?;
    }
    visibility.visible_subject(
      self
        .store
        .get_subject(comment.subject_ref())
        .await
        .map_err(Error::internal)?,
    )?;
    Ok(comment)
  }

  async fn replay(&self, actor: &Actor, key: Option<&str>) -> Result<Option<Comment>> {
    let Some(key) = key else { return Ok(None) };
    let existing = self
      .store
      .find_by_idempotency_key(&actor.id, key)
      .await
      .map_err(Error::internal)?;
    if let Some(c) = &existing {
      tracing::debug!(comment = c.id, actor = %actor.id, "idempotent replay");
    }
    Ok(existing)
  }

  async fn view_one(
    &self,
    comment: Comment,
    actor: Option<&Actor>,
    visibility: Visibility,
  ) -> Result<CommentView> {
    let mut views = self.views(vec![comment], actor, visibility).await?;
    views.pop().ok_or_else(|| Error::not_found("comment"))
  }

  /// Attach authors, like counts, reply counts, and the caller's like state
  /// using one batched query per concern.
  pub(crate) async fn views(
    &self,
    comments: Vec<Comment>,
    actor: Option<&Actor>,
    visibility: Visibility,
  ) -> Result<Vec<CommentView>> {
    if comments.is_empty() {
      return Ok(Vec::new());
    }
    let ids: Vec<CommentId> = comments.iter().map(|c| c.id).collect();
    let root_ids: Vec<CommentId> = comments.iter().filter(|c| c.is_root()).map(|c| c.id).collect();
    let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let reply_counts = self
      .store
      .count_replies(&root_ids, visibility)
      .await
      .map_err(Error::internal)?;
    let like_counts = self
      .store
      .count_reactions_many(TargetKind::Comment, &ids)
      .await
      .map_err(Error::internal)?;
    let liked: HashSet<CommentId> = match actor {
      Some(a) => self
        .store
        .reacted_among(TargetKind::Comment, &ids, &a.id)
        .await
        .map_err(Error::internal)?,
      None => HashSet::new(),
    };
    let names: HashMap<String, String> = self
      .store
      .display_names(&author_ids)
      .await
      .map_err(Error::internal)?;

    Ok(
      comments
        .into_iter()
        .map(|c| {
          let display_name = names
            .get(&c.author_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned());
          CommentView {
            id:          c.id,
            like_count:  like_counts.get(&c.id).copied().unwrap_or(0),
            reply_count: reply_counts.get(&c.id).copied().unwrap_or(0),
            liked_by_me: liked.contains(&c.id),
            author:      Author { id: c.author_id, display_name },
            text:        c.text,
            parent_id:   c.parent_id,
            created_at:  c.created_at,
            deleted_at:  c.deleted_at,
          }
        })
        .collect(),
    )
  }
}

/// A comment stored under an idempotency key must sit in the same place as
/// the request reusing that key.
pub(crate) fn same_target(
  existing: &Comment,
  subject: SubjectRef,
  parent_id: Option<CommentId>,
) -> Result<()> {
  if existing.subject_ref() != subject || existing.parent_id != parent_id {
    return Err(Error::validation("idempotency key was already used for another comment"));
  }
  Ok(())
}

/// View of a comment that was created a moment ago: nobody has liked or
/// replied to it yet.
fn fresh_view(comment: Comment, author: &Actor) -> CommentView {
  CommentView {
    id:          comment.id,
    text:        comment.text,
    parent_id:   comment.parent_id,
    created_at:  comment.created_at,
    deleted_at:  comment.deleted_at,
    author:      Author { id: author.id.clone(), display_name: author.display_name.clone() },
    like_count:  0,
    reply_count: 0,
    liked_by_me: false,
  }
}
