//! Typed parsing of URL path segments.

use murmur_core::{
  Result,
  comment::CommentId,
  subject::{Domain, SubjectRef, parse_id},
};

/// `/{domain}/{subjectId}/...`
pub fn subject(domain: &str, id: &str) -> Result<SubjectRef> {
  let domain: Domain = domain.parse()?;
  Ok(SubjectRef::new(domain, parse_id(id, "subject")?))
}

/// `/{domain}/comments/{commentId}/...`
pub fn comment(domain: &str, id: &str) -> Result<(Domain, CommentId)> {
  let domain: Domain = domain.parse()?;
  Ok((domain, parse_id(id, "comment")?))
}

/// Optional positive integer query parameter such as `?page=2`.
pub fn query_number(raw: Option<&str>, what: &str) -> Result<Option<u32>> {
  raw
    .map(|s| {
      s.trim()
        .parse::<u32>()
        .map_err(|_| murmur_core::Error::validation(format!("{what} must be a positive integer")))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
  use murmur_core::Error;

  use super::*;

  #[test]
  fn plural_and_singular_domains() {
    assert_eq!(subject("photos", "3").unwrap(), SubjectRef::new(Domain::Photo, 3));
    assert_eq!(comment("video", "9").unwrap(), (Domain::Video, 9));
  }

  #[test]
  fn unknown_domain_is_not_found_and_bad_id_is_invalid() {
    assert!(matches!(subject("podcasts", "1"), Err(Error::NotFound(_))));
    assert!(matches!(subject("posts", "abc"), Err(Error::Validation(_))));
    assert!(matches!(comment("posts", "-4"), Err(Error::Validation(_))));
  }

  #[test]
  fn query_numbers() {
    assert_eq!(query_number(None, "page").unwrap(), None);
    assert_eq!(query_number(Some("2"), "page").unwrap(), Some(2));
    assert!(query_number(Some("two"), "page").is_err());
  }
}
