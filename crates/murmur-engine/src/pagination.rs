//! Paged listing of root comments on a subject.

use murmur_core::{
  Error, Result,
  actor::Actor,
  comment::CommentPage,
  page::PageRequest,
  rate_limit::RateLimiter,
  store::Store,
  subject::SubjectRef,
  visibility::Visibility,
};

use crate::Engine;

impl<S, L> Engine<S, L>
where
  S: Store,
  L: RateLimiter,
{
  /// Root comments, newest first. `page` and `limit` fall back to page one
  /// and the configured default size. The total and the rows are filtered by
  /// the same visibility, so admins page over deleted comments too.
  pub async fn list_roots(
    &self,
    subject: SubjectRef,
    actor: Option<&Actor>,
    page: Option<u32>,
    limit: Option<u32>,
  ) -> Result<CommentPage> {
    let request = PageRequest::new(
      page,
      limit,
      self.config.default_page_size,
      self.config.max_page_size,
    )?;
    let visibility = Visibility::for_actor(actor);
    let subject = visibility
      .visible_subject(self.store.get_subject(subject).await.map_err(Error::internal)?)?
      .subject_ref();

    let total = self
      .store
      .count_roots(subject, visibility)
      .await
      .map_err(Error::internal)?;
    let roots = self
      .store
      .list_roots(subject, visibility, request.offset(), request.limit)
      .await
      .map_err(Error::internal)?;

    Ok(CommentPage {
      comments:   self.views(roots, actor, visibility).await?,
      pagination: request.info(total),
    })
  }
}
