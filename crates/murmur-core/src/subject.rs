//! Subjects: the post, photo, or video a comment thread hangs off.
//!
//! The three content domains used to carry their own copies of the comment
//! logic. Here they collapse into one [`Domain`] tag plus an id.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

pub type SubjectId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Domain {
  Post,
  Photo,
  Video,
}

impl Domain {
  pub const ALL: [Domain; 3] = [Domain::Post, Domain::Photo, Domain::Video];

  pub fn as_str(self) -> &'static str {
    match self {
      Domain::Post => "post",
      Domain::Photo => "photo",
      Domain::Video => "video",
    }
  }
}

impl fmt::Display for Domain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Accepts both singular and plural URL segments (`post`, `posts`, ...).
impl FromStr for Domain {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "post" | "posts" => Ok(Domain::Post),
      "photo" | "photos" => Ok(Domain::Photo),
      "video" | "videos" => Ok(Domain::Video),
      other => Err(Error::not_found(format!("domain {other:?}"))),
    }
  }
}

/// A reference to a subject as it arrives from a URL: domain plus id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
  pub domain: Domain,
  pub id:     SubjectId,
}

impl SubjectRef {
  pub fn new(domain: Domain, id: SubjectId) -> Self { Self { domain, id } }
}

impl fmt::Display for SubjectRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.domain, self.id)
  }
}

/// The capability the engine needs from a content item: identity and
/// publication state. Everything else about the post/photo/video is owned by
/// the content-management side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
  pub id:           SubjectId,
  pub domain:       Domain,
  pub is_published: bool,
}

impl Subject {
  pub fn subject_ref(&self) -> SubjectRef { SubjectRef::new(self.domain, self.id) }
}

/// Parse a numeric id from a path segment.
///
/// Failures are validation errors, not lookups: `"abc"` is a 400, an
/// unknown number is a 404.
pub fn parse_id(raw: &str, what: &str) -> Result<i64, Error> {
  raw
    .trim()
    .parse::<i64>()
    .ok()
    .filter(|id| *id > 0)
    .ok_or_else(|| Error::validation(format!("invalid {what} id: {raw:?}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_parses_singular_and_plural() {
    assert_eq!("posts".parse::<Domain>().unwrap(), Domain::Post);
    assert_eq!("Photo".parse::<Domain>().unwrap(), Domain::Photo);
    assert_eq!("videos".parse::<Domain>().unwrap(), Domain::Video);
    assert!(matches!("songs".parse::<Domain>(), Err(Error::NotFound(_))));
  }

  #[test]
  fn parse_id_rejects_garbage_as_validation() {
    assert_eq!(parse_id("42", "comment").unwrap(), 42);
    assert!(matches!(parse_id("4x2", "comment"), Err(Error::Validation(_))));
    assert!(matches!(parse_id("-1", "comment"), Err(Error::Validation(_))));
    assert!(matches!(parse_id("", "comment"), Err(Error::Validation(_))));
  }
}
