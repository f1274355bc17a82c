//! [`SqliteStore`], the SQLite implementation of every Murmur repository.

use std::{
  collections::{HashMap, HashSet},
  path::Path,
};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use murmur_core::{
  actor::{Actor, ActorId},
  comment::{Comment, CommentId, NewComment},
  notification::{NewNotification, Notification, NotificationId},
  reaction::{ReactionTarget, TargetKind},
  store::{
    ActorDirectory, CommentRepository, NotificationRepository, ReactionRepository, Repository,
    SubjectDirectory,
  },
  subject::{Subject, SubjectRef},
  visibility::Visibility,
};

use crate::{
  Error, Result,
  encode::{
    COMMENT_COLUMNS, NOTIFICATION_COLUMNS, RawActor, RawComment, RawNotification, decode_domain,
    encode_domain, encode_dt, encode_notification_kind, encode_role, encode_target_kind,
    hash_token, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Murmur store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Collaborator writes ───────────────────────────────────────────────────
  //
  // Actors, sessions, and subjects are owned by the identity and content
  // management sides. These helpers are how those sides (and tests) keep the
  // mirror tables current.

  /// Insert or replace an actor record, including role and ban state.
  pub async fn upsert_actor(&self, actor: &Actor) -> Result<()> {
    let id       = actor.id.clone();
    let name     = actor.display_name.clone();
    let role     = encode_role(actor.role);
    let banned   = actor.banned;
    let reason   = actor.ban_reason.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO actors (actor_id, display_name, role, banned, ban_reason)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (actor_id) DO UPDATE SET
             display_name = excluded.display_name,
             role         = excluded.role,
             banned       = excluded.banned,
             ban_reason   = excluded.ban_reason",
          rusqlite::params![id, name, role, banned, reason],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or update a subject's publication state.
  pub async fn upsert_subject(&self, subject: &Subject) -> Result<()> {
    let domain    = encode_domain(subject.domain);
    let id        = subject.id;
    let published = subject.is_published;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (domain, subject_id, is_published) VALUES (?1, ?2, ?3)
           ON CONFLICT (domain, subject_id) DO UPDATE SET is_published = excluded.is_published",
          rusqlite::params![domain, id, published],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Mint a fresh session token for an existing actor.
  ///
  /// The raw token is returned exactly once; only its hash is stored.
  pub async fn issue_session(&self, actor_id: &str) -> Result<String> {
    let token    = Uuid::new_v4().simple().to_string();
    let hash     = hash_token(&token);
    let actor    = actor_id.to_owned();
    let at_str   = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        let known = conn
          .query_row(
            "SELECT 1 FROM actors WHERE actor_id = ?1",
            rusqlite::params![actor],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !known {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO sessions (token_hash, actor_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![hash, actor, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::UnknownActor(actor_id.to_owned()));
    }
    Ok(token)
  }
}

/// Expand `ids` into `?,?,?` and matching owned values, starting at
/// placeholder index `first`.
fn in_list(ids: &[i64], first: usize) -> (String, Vec<Value>) {
  let placeholders = (first..first + ids.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  let values = ids.iter().map(|id| Value::Integer(*id)).collect();
  (placeholders, values)
}

// ─── Repository impls ────────────────────────────────────────────────────────

impl Repository for SqliteStore {
  type Error = Error;
}

impl SubjectDirectory for SqliteStore {
  async fn get_subject(&self, subject: SubjectRef) -> Result<Option<Subject>> {
    let domain = encode_domain(subject.domain);
    let id     = subject.id;

    let raw: Option<(String, i64, bool)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT domain, subject_id, is_published FROM subjects
               WHERE domain = ?1 AND subject_id = ?2",
              rusqlite::params![domain, id],
              |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(domain, id, is_published)| {
        Ok(Subject { id, domain: decode_domain(&domain)?, is_published })
      })
      .transpose()
  }
}

impl ActorDirectory for SqliteStore {
  async fn resolve_session(&self, token: &str) -> Result<Option<Actor>> {
    let hash = hash_token(token);

    let raw: Option<RawActor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT a.actor_id, a.display_name, a.role, a.banned, a.ban_reason
               FROM sessions s
               JOIN actors a ON a.actor_id = s.actor_id
               WHERE s.token_hash = ?1",
              rusqlite::params![hash],
              |row| {
                Ok(RawActor {
                  actor_id:     row.get(0)?,
                  display_name: row.get(1)?,
                  role:         row.get(2)?,
                  banned:       row.get(3)?,
                  ban_reason:   row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawActor::into_actor).transpose()
  }

  async fn display_names(&self, ids: &[ActorId]) -> Result<HashMap<ActorId, String>> {
    if ids.is_empty() {
      return Ok(HashMap::new());
    }
    let values: Vec<Value> = ids.iter().map(|id| Value::Text(id.clone())).collect();
    let placeholders = (1..=values.len())
      .map(|i| format!("?{i}"))
      .collect::<Vec<_>>()
      .join(", ");

    let rows: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT actor_id, display_name FROM actors WHERE actor_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows.into_iter().collect())
  }
}

impl CommentRepository for SqliteStore {
  async fn insert_comment(&self, input: NewComment) -> Result<Comment> {
    let domain  = encode_domain(input.subject.domain);
    let subject = input.subject.id;
    let at_str  = encode_dt(now());

    let raw: RawComment = self
      .conn
      .call(move |conn| {
        // A concurrent request with the same idempotency key loses the race
        // quietly and reads back the winner's row.
        let inserted = conn.execute(
          "INSERT INTO comments (
             domain, subject_id, author_id, parent_id, text, created_at, idempotency_key
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (author_id, idempotency_key) DO NOTHING",
          rusqlite::params![
            domain,
            subject,
            input.author_id,
            input.parent_id,
            input.text,
            at_str,
            input.idempotency_key,
          ],
        )?;

        let row = if inserted == 1 {
          let id = conn.last_insert_rowid();
          conn.query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
            rusqlite::params![id],
            RawComment::from_row,
          )?
        } else {
          conn.query_row(
            &format!(
              "SELECT {COMMENT_COLUMNS} FROM comments
               WHERE author_id = ?1 AND idempotency_key = ?2"
            ),
            rusqlite::params![input.author_id, input.idempotency_key],
            RawComment::from_row,
          )?
        };
        Ok(row)
      })
      .await?;

    raw.into_comment()
  }

  async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
              rusqlite::params![id],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn find_by_idempotency_key(&self, author: &str, key: &str) -> Result<Option<Comment>> {
    let author = author.to_owned();
    let key    = key.to_owned();

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {COMMENT_COLUMNS} FROM comments
                 WHERE author_id = ?1 AND idempotency_key = ?2"
              ),
              rusqlite::params![author, key],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn list_roots(
    &self,
    subject:    SubjectRef,
    visibility: Visibility,
    offset:     u64,
    limit:      u32,
  ) -> Result<Vec<Comment>> {
    let domain          = encode_domain(subject.domain);
    let subject_id      = subject.id;
    let include_deleted = visibility.includes_deleted();
    let offset          = i64::try_from(offset).unwrap_or(i64::MAX);
    let limit           = i64::from(limit);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments
           WHERE domain = ?1 AND subject_id = ?2 AND parent_id IS NULL
             AND (?3 OR deleted_at IS NULL)
           ORDER BY created_at DESC, comment_id DESC
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![domain, subject_id, include_deleted, limit, offset],
            RawComment::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn count_roots(&self, subject: SubjectRef, visibility: Visibility) -> Result<u64> {
    let domain          = encode_domain(subject.domain);
    let subject_id      = subject.id;
    let include_deleted = visibility.includes_deleted();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM comments
           WHERE domain = ?1 AND subject_id = ?2 AND parent_id IS NULL
             AND (?3 OR deleted_at IS NULL)",
          rusqlite::params![domain, subject_id, include_deleted],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn list_replies(&self, parent: CommentId, visibility: Visibility) -> Result<Vec<Comment>> {
    let include_deleted = visibility.includes_deleted();

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments
           WHERE parent_id = ?1 AND (?2 OR deleted_at IS NULL)
           ORDER BY created_at ASC, comment_id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![parent, include_deleted], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn count_replies(
    &self,
    parents:    &[CommentId],
    visibility: Visibility,
  ) -> Result<HashMap<CommentId, u64>> {
    if parents.is_empty() {
      return Ok(HashMap::new());
    }
    let include_deleted = visibility.includes_deleted();
    let (placeholders, mut values) = in_list(parents, 2);
    values.insert(0, Value::Integer(i64::from(include_deleted)));

    let rows: Vec<(i64, i64)> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT parent_id, COUNT(*) FROM comments
           WHERE parent_id IN ({placeholders}) AND (?1 OR deleted_at IS NULL)
           GROUP BY parent_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows.into_iter().map(|(id, n)| (id, n.max(0) as u64)).collect())
  }

  async fn soft_delete(&self, id: CommentId, at: DateTime<Utc>) -> Result<Option<Comment>> {
    let at_str = encode_dt(at);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE comments SET deleted_at = COALESCE(deleted_at, ?1) WHERE comment_id = ?2",
          rusqlite::params![at_str, id],
        )?;
        Ok(
          conn
            .query_row(
              &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
              rusqlite::params![id],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }
}

impl ReactionRepository for SqliteStore {
  async fn add_reaction(&self, target: ReactionTarget, actor: &str) -> Result<bool> {
    let kind   = encode_target_kind(target.kind());
    let id     = target.id();
    let actor  = actor.to_owned();
    let at_str = encode_dt(Utc::now());

    // The primary key is the source of truth for "one like per actor";
    // concurrent likes collapse into a single row here.
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO reactions (target_kind, target_id, actor_id, created_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (target_kind, target_id, actor_id) DO NOTHING",
          rusqlite::params![kind, id, actor, at_str],
        )?)
      })
      .await?;

    Ok(inserted == 1)
  }

  async fn remove_reaction(&self, target: ReactionTarget, actor: &str) -> Result<bool> {
    let kind  = encode_target_kind(target.kind());
    let id    = target.id();
    let actor = actor.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM reactions WHERE target_kind = ?1 AND target_id = ?2 AND actor_id = ?3",
          rusqlite::params![kind, id, actor],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn count_reactions(&self, target: ReactionTarget) -> Result<u64> {
    let kind = encode_target_kind(target.kind());
    let id   = target.id();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM reactions WHERE target_kind = ?1 AND target_id = ?2",
          rusqlite::params![kind, id],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn count_reactions_many(&self, kind: TargetKind, ids: &[i64]) -> Result<HashMap<i64, u64>> {
    if ids.is_empty() {
      return Ok(HashMap::new());
    }
    let (placeholders, mut values) = in_list(ids, 2);
    values.insert(0, Value::Text(encode_target_kind(kind).to_owned()));

    let rows: Vec<(i64, i64)> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT target_id, COUNT(*) FROM reactions
           WHERE target_kind = ?1 AND target_id IN ({placeholders})
           GROUP BY target_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows.into_iter().map(|(id, n)| (id, n.max(0) as u64)).collect())
  }

  async fn reacted_among(&self, kind: TargetKind, ids: &[i64], actor: &str) -> Result<HashSet<i64>> {
    if ids.is_empty() {
      return Ok(HashSet::new());
    }
    let (placeholders, mut values) = in_list(ids, 3);
    values.insert(0, Value::Text(encode_target_kind(kind).to_owned()));
    values.insert(1, Value::Text(actor.to_owned()));

    let rows: Vec<i64> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT target_id FROM reactions
           WHERE target_kind = ?1 AND actor_id = ?2 AND target_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values.iter()), |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows.into_iter().collect())
  }
}

impl NotificationRepository for SqliteStore {
  async fn insert_notification(&self, input: NewNotification) -> Result<Notification> {
    let created_at   = now();
    let at_str       = encode_dt(created_at);
    let kind         = encode_notification_kind(input.kind);
    let payload_json = serde_json::to_string(&input.payload)?;
    let recipient    = input.recipient_actor_id.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (recipient_id, kind, payload_json, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![recipient, kind, payload_json, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Notification {
      id,
      recipient_actor_id: input.recipient_actor_id,
      kind: input.kind,
      payload: input.payload,
      created_at,
      read_at: None,
    })
  }

  async fn list_notifications(&self, recipient: &str, limit: u32) -> Result<Vec<Notification>> {
    let recipient = recipient.to_owned();
    let limit     = i64::from(limit);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications
           WHERE recipient_id = ?1
           ORDER BY created_at DESC, notification_id DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![recipient, limit], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn count_unread(&self, recipient: &str) -> Result<u64> {
    let recipient = recipient.to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND read_at IS NULL",
          rusqlite::params![recipient],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn mark_read(
    &self,
    id:        NotificationId,
    recipient: &str,
    at:        DateTime<Utc>,
  ) -> Result<Option<Notification>> {
    let recipient = recipient.to_owned();
    let at_str    = encode_dt(at);

    let raw: Option<RawNotification> = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE notifications SET read_at = COALESCE(read_at, ?1)
           WHERE notification_id = ?2 AND recipient_id = ?3",
          rusqlite::params![at_str, id, recipient],
        )?;
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM notifications
                 WHERE notification_id = ?1 AND recipient_id = ?2"
              ),
              rusqlite::params![id, recipient],
              RawNotification::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawNotification::into_notification).transpose()
  }

  async fn mark_all_read(&self, recipient: &str, at: DateTime<Utc>) -> Result<u64> {
    let recipient = recipient.to_owned();
    let at_str    = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET read_at = ?1 WHERE recipient_id = ?2 AND read_at IS NULL",
          rusqlite::params![at_str, recipient],
        )?)
      })
      .await?;

    Ok(changed as u64)
  }
}
