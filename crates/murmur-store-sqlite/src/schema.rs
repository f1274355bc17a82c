//! SQL schema for the Murmur SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Mirrored from the identity provider; the engine only reads it.
CREATE TABLE IF NOT EXISTS actors (
    actor_id      TEXT PRIMARY KEY,
    display_name  TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'user',   -- 'admin' | 'user'
    banned        INTEGER NOT NULL DEFAULT 0,
    ban_reason    TEXT
);

-- Only the SHA-256 of a session token is ever stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash  TEXT PRIMARY KEY,
    actor_id    TEXT NOT NULL REFERENCES actors(actor_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

-- Posts, photos, and videos as far as comments care: identity + published.
CREATE TABLE IF NOT EXISTS subjects (
    domain        TEXT NOT NULL,                  -- 'post' | 'photo' | 'video'
    subject_id    INTEGER NOT NULL,
    is_published  INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (domain, subject_id)
);

-- Rows are never updated except to stamp deleted_at.
CREATE TABLE IF NOT EXISTS comments (
    comment_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    domain           TEXT NOT NULL,
    subject_id       INTEGER NOT NULL,
    author_id        TEXT NOT NULL,
    parent_id        INTEGER REFERENCES comments(comment_id) ON DELETE CASCADE,
    text             TEXT NOT NULL,
    created_at       TEXT NOT NULL,               -- RFC 3339, fixed-width micros
    deleted_at       TEXT,
    idempotency_key  TEXT,
    FOREIGN KEY (domain, subject_id)
        REFERENCES subjects(domain, subject_id) ON DELETE CASCADE,
    UNIQUE (author_id, idempotency_key)
);

-- Threads stop at depth one.
CREATE TRIGGER IF NOT EXISTS comments_depth_guard
BEFORE INSERT ON comments
WHEN NEW.parent_id IS NOT NULL
 AND (SELECT parent_id FROM comments WHERE comment_id = NEW.parent_id) IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'reply nesting exceeds depth 1');
END;

-- target_kind: 'comment' | 'post' | 'photo' | 'video'
CREATE TABLE IF NOT EXISTS reactions (
    target_kind  TEXT NOT NULL,
    target_id    INTEGER NOT NULL,
    actor_id     TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (target_kind, target_id, actor_id)
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    recipient_id     TEXT NOT NULL,
    kind             TEXT NOT NULL,
    payload_json     TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    read_at          TEXT
);

CREATE INDEX IF NOT EXISTS comments_roots_idx
    ON comments(domain, subject_id, parent_id, created_at);
CREATE INDEX IF NOT EXISTS comments_parent_idx
    ON comments(parent_id, created_at);
CREATE INDEX IF NOT EXISTS notifications_recipient_idx
    ON notifications(recipient_id, created_at);

PRAGMA user_version = 1;
";
