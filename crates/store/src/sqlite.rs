//! SQLite profile store.
//!
//! Uses a single SQLite database file with four tables:
//! - `users` — identity, display name, activity timestamps
//! - `chat_sessions` — named conversation threads, one owner each
//! - `chat_messages` — transcript rows, at most 100 retained per session
//! - `user_personalization` — one personalization row per user
//!
//! Multi-statement operations run in one transaction so no intermediate
//! state (a transcript over the cap, a user without a profile row) is ever
//! observable.

use aanya_core::error::StorageError;
use aanya_core::message::{ChatMessage, Role, SessionSummary, UserStats};
use aanya_core::profile::{
    ConversationStyle, EmojiPreference, PersonalityType, PersonalizationProfile, ProfileUpdate,
};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Maximum messages retained per session. Enforced atomically with every
/// insert: the newest 100 by (timestamp, id) survive.
pub const MESSAGE_RETENTION_CAP: i64 = 100;

/// The production SQLite profile store.
pub struct ProfileStore {
    pool: SqlitePool,
}

impl ProfileStore {
    /// Open (or create) the store at a file path.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database
    /// (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StorageError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite profile store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run schema migrations — creates all four tables and indexes.
    async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                email         TEXT UNIQUE NOT NULL,
                name          TEXT NOT NULL,
                created_at    TEXT NOT NULL,
                last_seen_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("users table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id),
                name        TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("chat_sessions table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  INTEGER NOT NULL REFERENCES chat_sessions(id),
                role        TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content     TEXT NOT NULL,
                timestamp   TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("chat_messages table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_personalization (
                user_id             INTEGER PRIMARY KEY REFERENCES users(id),
                personality_type    TEXT NOT NULL DEFAULT 'girlfriend',
                custom_prompt       TEXT,
                favorite_topics     TEXT NOT NULL DEFAULT '[]',
                conversation_style  TEXT NOT NULL DEFAULT 'casual',
                emoji_preference    TEXT NOT NULL DEFAULT 'rare',
                updated_at          TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("user_personalization table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_session_ts
             ON chat_messages(session_id, timestamp)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("messages index: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sessions_user_updated
             ON chat_sessions(user_id, updated_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::MigrationFailed(format!("sessions index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Create a user (with a default personalization row) or return the
    /// existing id, bumping last-activity. Idempotent.
    pub async fn get_or_create_user(
        &self,
        email: &str,
        display_name: &str,
    ) -> Result<i64, StorageError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Storage(format!("BEGIN failed: {e}")))?;

        let existing = sqlx::query("SELECT id FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("user lookup: {e}")))?;

        let user_id = match existing {
            Some(row) => {
                let id: i64 = row
                    .try_get("id")
                    .map_err(|e| StorageError::QueryFailed(format!("id column: {e}")))?;
                sqlx::query("UPDATE users SET last_seen_at = ?1 WHERE id = ?2")
                    .bind(&now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| StorageError::Storage(format!("last_seen update: {e}")))?;
                id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO users (email, name, created_at, last_seen_at)
                     VALUES (?1, ?2, ?3, ?3)",
                )
                .bind(email)
                .bind(display_name)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Storage(format!("user insert: {e}")))?;
                let id = result.last_insert_rowid();

                sqlx::query(
                    "INSERT INTO user_personalization (user_id, updated_at) VALUES (?1, ?2)",
                )
                .bind(id)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Storage(format!("personalization insert: {e}")))?;

                debug!(user_id = id, "Created user {email}");
                id
            }
        };

        tx.commit()
            .await
            .map_err(|e| StorageError::Storage(format!("COMMIT failed: {e}")))?;
        Ok(user_id)
    }

    /// Create a new chat session. A missing name gets one generated from
    /// the creation timestamp; names are never checked for duplicates.
    pub async fn create_session(
        &self,
        user_id: i64,
        name: Option<&str>,
    ) -> Result<i64, StorageError> {
        let now = Utc::now();
        let session_name = match name {
            Some(n) => n.to_string(),
            None => format!("Chat {}", now.format("%Y-%m-%d %H:%M")),
        };

        let result = sqlx::query(
            "INSERT INTO chat_sessions (user_id, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
        )
        .bind(user_id)
        .bind(&session_name)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Storage(format!("session insert: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    /// Append a message, enforce the retention cap, and bump the session's
    /// updated timestamp — all in one transaction, so no state with more
    /// than [`MESSAGE_RETENTION_CAP`] messages is ever observable.
    pub async fn append_message(
        &self,
        session_id: i64,
        role: Role,
        content: &str,
    ) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Storage(format!("BEGIN failed: {e}")))?;

        sqlx::query(
            "INSERT INTO chat_messages (session_id, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Storage(format!("message insert: {e}")))?;

        // Keep only the newest messages; id breaks timestamp ties.
        sqlx::query(
            "DELETE FROM chat_messages
             WHERE session_id = ?1 AND id NOT IN (
                 SELECT id FROM chat_messages
                 WHERE session_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2
             )",
        )
        .bind(session_id)
        .bind(MESSAGE_RETENTION_CAP)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Storage(format!("retention sweep: {e}")))?;

        sqlx::query("UPDATE chat_sessions SET updated_at = ?1 WHERE id = ?2")
            .bind(&now)
            .bind(session_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Storage(format!("session bump: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Storage(format!("COMMIT failed: {e}")))?;
        Ok(())
    }

    /// Fetch a session's transcript, ascending by time, capped at `limit`.
    pub async fn get_history(
        &self,
        session_id: i64,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StorageError> {
        let rows = sqlx::query(
            "SELECT role, content, timestamp FROM chat_messages
             WHERE session_id = ?1
             ORDER BY timestamp ASC, id ASC
             LIMIT ?2",
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(format!("history fetch: {e}")))?;

        rows.iter()
            .map(|row| {
                let role_str: String = row
                    .try_get("role")
                    .map_err(|e| StorageError::QueryFailed(format!("role column: {e}")))?;
                let content: String = row
                    .try_get("content")
                    .map_err(|e| StorageError::QueryFailed(format!("content column: {e}")))?;
                let ts: String = row
                    .try_get("timestamp")
                    .map_err(|e| StorageError::QueryFailed(format!("timestamp column: {e}")))?;
                Ok(ChatMessage {
                    role: Role::parse(&role_str).unwrap_or(Role::User),
                    content,
                    timestamp: parse_timestamp(&ts),
                })
            })
            .collect()
    }

    /// List a user's sessions, most recently active first.
    pub async fn list_sessions(&self, user_id: i64) -> Result<Vec<SessionSummary>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM chat_sessions
             WHERE user_id = ?1
             ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(format!("session list: {e}")))?;

        rows.iter()
            .map(|row| {
                let id: i64 = row
                    .try_get("id")
                    .map_err(|e| StorageError::QueryFailed(format!("id column: {e}")))?;
                let name: String = row
                    .try_get("name")
                    .map_err(|e| StorageError::QueryFailed(format!("name column: {e}")))?;
                let created: String = row
                    .try_get("created_at")
                    .map_err(|e| StorageError::QueryFailed(format!("created_at column: {e}")))?;
                let updated: String = row
                    .try_get("updated_at")
                    .map_err(|e| StorageError::QueryFailed(format!("updated_at column: {e}")))?;
                Ok(SessionSummary {
                    id,
                    name,
                    created_at: parse_timestamp(&created),
                    updated_at: parse_timestamp(&updated),
                })
            })
            .collect()
    }

    /// Delete a session and its messages, but only if it belongs to the
    /// given user. An ownership mismatch is a silent no-op, not an error —
    /// deletes never leak whether a foreign session exists.
    pub async fn delete_session(&self, session_id: i64, user_id: i64) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Storage(format!("BEGIN failed: {e}")))?;

        // Ownership check comes before any deletion of dependent messages.
        let owned = sqlx::query("SELECT id FROM chat_sessions WHERE id = ?1 AND user_id = ?2")
            .bind(session_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("ownership check: {e}")))?;

        if owned.is_some() {
            sqlx::query("DELETE FROM chat_messages WHERE session_id = ?1")
                .bind(session_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Storage(format!("message delete: {e}")))?;
            sqlx::query("DELETE FROM chat_sessions WHERE id = ?1")
                .bind(session_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Storage(format!("session delete: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Storage(format!("COMMIT failed: {e}")))?;
        Ok(())
    }

    /// Read a user's personalization profile; defaults if the row is missing.
    pub async fn get_profile(&self, user_id: i64) -> Result<PersonalizationProfile, StorageError> {
        let row = sqlx::query(
            "SELECT personality_type, custom_prompt, favorite_topics,
                    conversation_style, emoji_preference, updated_at
             FROM user_personalization WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(format!("profile fetch: {e}")))?;

        let Some(row) = row else {
            return Ok(PersonalizationProfile::default());
        };

        let personality: String = row
            .try_get("personality_type")
            .map_err(|e| StorageError::QueryFailed(format!("personality_type column: {e}")))?;
        let custom_prompt: Option<String> = row
            .try_get("custom_prompt")
            .map_err(|e| StorageError::QueryFailed(format!("custom_prompt column: {e}")))?;
        let topics_json: String = row
            .try_get("favorite_topics")
            .map_err(|e| StorageError::QueryFailed(format!("favorite_topics column: {e}")))?;
        let style: String = row
            .try_get("conversation_style")
            .map_err(|e| StorageError::QueryFailed(format!("conversation_style column: {e}")))?;
        let emoji: String = row
            .try_get("emoji_preference")
            .map_err(|e| StorageError::QueryFailed(format!("emoji_preference column: {e}")))?;
        let updated_at: String = row
            .try_get("updated_at")
            .map_err(|e| StorageError::QueryFailed(format!("updated_at column: {e}")))?;

        Ok(PersonalizationProfile {
            personality_type: PersonalityType::parse(&personality).unwrap_or_default(),
            custom_prompt,
            favorite_topics: serde_json::from_str(&topics_json).unwrap_or_default(),
            conversation_style: ConversationStyle::parse(&style).unwrap_or_default(),
            emoji_preference: EmojiPreference::parse(&emoji).unwrap_or_default(),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    /// Write the fields a [`ProfileUpdate`] carries and bump `updated_at`.
    ///
    /// Only the allow-listed columns can be touched; an empty update is a
    /// no-op. All-or-nothing per call.
    pub async fn apply_profile_updates(
        &self,
        user_id: i64,
        updates: &ProfileUpdate,
    ) -> Result<(), StorageError> {
        if updates.is_empty() {
            return Ok(());
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(personality) = updates.personality_type {
            assignments.push("personality_type = ?");
            values.push(personality.as_str().to_string());
        }
        if let Some(ref custom) = updates.custom_prompt {
            assignments.push("custom_prompt = ?");
            values.push(custom.clone());
        }
        if let Some(ref topics) = updates.favorite_topics {
            assignments.push("favorite_topics = ?");
            values.push(
                serde_json::to_string(topics)
                    .map_err(|e| StorageError::Storage(format!("topics serialization: {e}")))?,
            );
        }
        if let Some(style) = updates.conversation_style {
            assignments.push("conversation_style = ?");
            values.push(style.as_str().to_string());
        }
        if let Some(emoji) = updates.emoji_preference {
            assignments.push("emoji_preference = ?");
            values.push(emoji.as_str().to_string());
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Storage(format!("BEGIN failed: {e}")))?;

        // A user created out-of-band still gets a row to update.
        sqlx::query(
            "INSERT INTO user_personalization (user_id, updated_at) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Storage(format!("profile upsert: {e}")))?;

        let sql = format!(
            "UPDATE user_personalization SET {}, updated_at = ? WHERE user_id = ?",
            assignments.join(", ")
        );
        let mut query = sqlx::query(&sql);
        for value in &values {
            query = query.bind(value);
        }
        query = query.bind(&now).bind(user_id);
        query
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Storage(format!("profile update: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Storage(format!("COMMIT failed: {e}")))?;
        Ok(())
    }

    /// Aggregate statistics for one user.
    pub async fn get_stats(&self, user_id: i64) -> Result<UserStats, StorageError> {
        let sessions = sqlx::query("SELECT COUNT(*) AS cnt FROM chat_sessions WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("session count: {e}")))?;
        let session_count: i64 = sessions
            .try_get("cnt")
            .map_err(|e| StorageError::QueryFailed(format!("cnt column: {e}")))?;

        let messages = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM chat_messages cm
             JOIN chat_sessions cs ON cm.session_id = cs.id
             WHERE cs.user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(format!("message count: {e}")))?;
        let message_count: i64 = messages
            .try_get("cnt")
            .map_err(|e| StorageError::QueryFailed(format!("cnt column: {e}")))?;

        let user = sqlx::query("SELECT created_at FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(format!("user fetch: {e}")))?
            .ok_or_else(|| StorageError::QueryFailed(format!("unknown user id {user_id}")))?;
        let created: String = user
            .try_get("created_at")
            .map_err(|e| StorageError::QueryFailed(format!("created_at column: {e}")))?;

        Ok(UserStats {
            session_count,
            message_count,
            member_since: parse_timestamp(&created),
        })
    }
}

/// Parse a stored RFC 3339 timestamp, falling back to now on corruption.
fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
