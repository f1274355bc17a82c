//! Like and unlike, on comments and on subjects.

use murmur_core::{
  Error, Result,
  actor::Actor,
  comment::CommentId,
  rate_limit::RateLimiter,
  reaction::{LikeState, ReactionTarget},
  store::Store,
  subject::{Domain, SubjectRef},
  visibility::Visibility,
};

use crate::{Engine, LIKE_ACTION, writer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Toggle {
  Like,
  Unlike,
}

impl<S, L> Engine<S, L>
where
  S: Store,
  L: RateLimiter,
{
  pub async fn like_comment(
    &self,
    domain: Domain,
    comment_id: CommentId,
    actor: Option<&Actor>,
  ) -> Result<LikeState> {
    self.toggle_comment(domain, comment_id, actor, Toggle::Like).await
  }

  pub async fn unlike_comment(
    &self,
    domain: Domain,
    comment_id: CommentId,
    actor: Option<&Actor>,
  ) -> Result<LikeState> {
    self.toggle_comment(domain, comment_id, actor, Toggle::Unlike).await
  }

  pub async fn like_subject(
    &self,
    subject: SubjectRef,
    actor: Option<&Actor>,
  ) -> Result<LikeState> {
    self.toggle_subject(subject, actor, Toggle::Like).await
  }

  pub async fn unlike_subject(
    &self,
    subject: SubjectRef,
    actor: Option<&Actor>,
  ) -> Result<LikeState> {
    self.toggle_subject(subject, actor, Toggle::Unlike).await
  }

  async fn toggle_comment(
    &self,
    domain: Domain,
    comment_id: CommentId,
    actor: Option<&Actor>,
    toggle: Toggle,
  ) -> Result<LikeState> {
    let actor = writer(actor, "like_comment")?;
    let comment = self
      .visible_comment(domain, comment_id, Visibility::for_actor(Some(actor)))
      .await?;
    self.set_reaction(ReactionTarget::comment(comment.id), actor, toggle).await
  }

  async fn toggle_subject(
    &self,
    subject: SubjectRef,
    actor: Option<&Actor>,
    toggle: Toggle,
  ) -> Result<LikeState> {
    let actor = writer(actor, "like_subject")?;
    let subject = Visibility::for_actor(Some(actor))
      .visible_subject(self.store.get_subject(subject).await.map_err(Error::internal)?)?;
    self
      .set_reaction(ReactionTarget::subject(subject.subject_ref()), actor, toggle)
      .await
  }

  /// Apply the like or unlike and report the recounted state. Repeating
  /// either is a no-op that still returns the current state.
  async fn set_reaction(
    &self,
    target: ReactionTarget,
    actor: &Actor,
    toggle: Toggle,
  ) -> Result<LikeState> {
    self.gate(LIKE_ACTION, actor, self.config.like_cooldown()).await?;

    let changed = match toggle {
      Toggle::Like => self.store.add_reaction(target, &actor.id).await,
      Toggle::Unlike => self.store.remove_reaction(target, &actor.id).await,
    }
    .map_err(Error::internal)?;
    if changed {
      tracing::debug!(?target, actor = %actor.id, ?toggle, "reaction changed");
    }

    let like_count = self
      .store
      .count_reactions(target)
      .await
      .map_err(Error::internal)?;
    Ok(LikeState { like_count, liked_by_me: toggle == Toggle::Like })
  }
}
