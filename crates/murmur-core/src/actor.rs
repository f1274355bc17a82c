//! The already-resolved caller identity.
//!
//! The engine never looks at cookies or sessions. Every operation takes an
//! `Option<&Actor>`; `None` means the request is anonymous.

use serde::{Deserialize, Serialize};

/// Opaque identifier issued by the external identity provider.
pub type ActorId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Admin,
  User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
  pub id:           ActorId,
  pub display_name: String,
  pub role:         Role,
  pub banned:       bool,
  pub ban_reason:   Option<String>,
}

impl Actor {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Public author block embedded in every [`crate::comment::CommentView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
  pub id:           ActorId,
  pub display_name: String,
}
